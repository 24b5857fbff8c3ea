use crate::core::actions::cancellation::{CancelToken, Cancelled};

/// Why a build produced no content.
///
/// Everything except `Cancelled` is shown to the user as an overlay and
/// clears the rendering's feasible flag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("bad mapping: {0}")]
    BadMapping(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("transient failure: {0}")]
    Transient(String),
}

impl BuildError {
    pub fn bad_mapping(msg: impl Into<String>) -> Self {
        Self::BadMapping(msg.into())
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Turns a data request (data plus mapping/control state) into inert,
/// presentation-ready content.
///
/// Runs off the draw thread. Long builds should call `cancel.check()?`
/// between stages so superseded work stops early.
pub trait ContentBuilder: Send + Sync + 'static {
    type Request: Send + Sync + 'static;
    type Content: Send + Sync + 'static;

    fn build(
        &self,
        request: &Self::Request,
        cancel: &dyn CancelToken,
    ) -> Result<Self::Content, BuildError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::cancellation::CancelFlag;

    struct Doubler;

    impl ContentBuilder for Doubler {
        type Request = i32;
        type Content = i32;

        fn build(&self, request: &i32, cancel: &dyn CancelToken) -> Result<i32, BuildError> {
            cancel.check()?;
            if *request < 0 {
                return Err(BuildError::bad_mapping("negative input"));
            }
            Ok(request * 2)
        }
    }

    #[test]
    fn cancellation_converts_through_question_mark() {
        let flag = CancelFlag::new();
        flag.cancel();

        let result = Doubler.build(&4, &flag);

        assert_eq!(result, Err(BuildError::Cancelled(Cancelled)));
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn build_failures_are_not_cancellations() {
        let flag = CancelFlag::new();

        let error = Doubler.build(&-1, &flag).unwrap_err();

        assert!(!error.is_cancelled());
        assert_eq!(error.to_string(), "bad mapping: negative input");
    }
}
