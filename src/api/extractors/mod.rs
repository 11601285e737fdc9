/*!
 * Principal extractor
 *
 * Responsibility:
 * - token stage が request extensions に入れた Principal を handler に渡す
 */

mod principal;

pub use principal::CurrentPrincipal;
