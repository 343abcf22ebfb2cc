use std::error::Error;
use std::fmt;
use std::iter;

/// Displays an error followed by its whole `source()` chain, `: `-separated.
pub struct ErrorWithCauses<E>(pub E);

impl<E> fmt::Display for ErrorWithCauses<E>
where
    E: Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        for cause in iter::successors(self.0.source(), |e| (*e).source()) {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}
