use crate::core::animation::errors::AnimationError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }

    #[must_use]
    pub fn from_forward(forward: bool) -> Self {
        if forward { Self::Forward } else { Self::Backward }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Snapshot of everything an animation control persists.
///
/// Its `Display` form is the save string:
/// `<on> <forward> <current> <numSteps> <step_0> ... <step_n-1> <computeSet>`
/// with booleans as `true`/`false` and steps in whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    pub on: bool,
    pub direction: Direction,
    pub current: usize,
    pub steps: Vec<Duration>,
    pub compute_set: bool,
}

/// A parsed save string. The compute-set token is optional on restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveRecord {
    pub on: bool,
    pub direction: Direction,
    pub current: usize,
    pub steps: Vec<Duration>,
    pub compute_set: Option<bool>,
}

impl SaveRecord {
    /// Validates every token before anything is returned, so a failed
    /// restore never leaves partial state behind.
    pub(crate) fn parse(save: &str) -> Result<Self, AnimationError> {
        let tokens: Vec<&str> = save.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(AnimationError::invalid_save_string(format!(
                "expected at least 4 tokens, found {}",
                tokens.len()
            )));
        }

        let on = parse_bool(tokens[0], "on")?;
        let direction = Direction::from_forward(parse_bool(tokens[1], "direction")?);
        let current = parse_int(tokens[2], "current")?;
        if current < 0 {
            return Err(AnimationError::invalid_save_string(format!(
                "current index {current} is negative"
            )));
        }

        let num_steps = parse_int(tokens[3], "number of steps")?;
        if num_steps <= 0 {
            return Err(AnimationError::invalid_save_string(
                "number of steps is not positive",
            ));
        }
        let num_steps = usize::try_from(num_steps)
            .map_err(|_| AnimationError::invalid_save_string("number of steps is too large"))?;
        if tokens.len() < 4 + num_steps {
            return Err(AnimationError::invalid_save_string(format!(
                "expected {num_steps} step entries, found {}",
                tokens.len() - 4
            )));
        }

        let steps = tokens[4..4 + num_steps]
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let ms = parse_int(token, "step")?;
                if ms <= 0 {
                    return Err(AnimationError::invalid_save_string(format!(
                        "step #{} is not positive",
                        i + 1
                    )));
                }
                Ok(Duration::from_millis(ms.unsigned_abs()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let compute_set = tokens
            .get(4 + num_steps)
            .map(|token| parse_bool(token, "compute set"))
            .transpose()?;

        Ok(Self {
            on,
            direction,
            current: usize::try_from(current)
                .map_err(|_| AnimationError::invalid_save_string("current index is too large"))?,
            steps,
            compute_set,
        })
    }
}

fn parse_bool(token: &str, what: &str) -> Result<bool, AnimationError> {
    if token.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AnimationError::invalid_save_string(format!(
            "{what}: expected true or false, found {token:?}"
        )))
    }
}

fn parse_int(token: &str, what: &str) -> Result<i64, AnimationError> {
    token.parse().map_err(|_| {
        AnimationError::invalid_save_string(format!("{what}: expected an integer, found {token:?}"))
    })
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on,
            self.direction.is_forward(),
            self.current,
            self.steps.len()
        )?;
        for step in &self.steps {
            write!(f, " {}", step.as_millis())?;
        }
        write!(f, " {}", self.compute_set)
    }
}

impl FromStr for AnimationState {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record = SaveRecord::parse(s)?;
        Ok(Self {
            on: record.on,
            direction: record.direction,
            current: record.current,
            steps: record.steps,
            compute_set: record.compute_set.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn save_string_layout() {
        let state = AnimationState {
            on: true,
            direction: Direction::Backward,
            current: 2,
            steps: ms(&[100, 250, 500]),
            compute_set: false,
        };

        assert_eq!(state.to_string(), "true false 2 3 100 250 500 false");
    }

    #[test]
    fn parse_inverts_display() {
        let state = AnimationState {
            on: false,
            direction: Direction::Forward,
            current: 7,
            steps: ms(&[500; 9]),
            compute_set: true,
        };

        let parsed: AnimationState = state.to_string().parse().unwrap();

        assert_eq!(parsed, state);
    }

    #[test]
    fn compute_set_token_is_optional() {
        let record = SaveRecord::parse("true true 0 1 200").unwrap();

        assert_eq!(record.compute_set, None);
        assert_eq!(record.steps, ms(&[200]));
        let state: AnimationState = "true true 0 1 200".parse().unwrap();
        assert!(state.compute_set);
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let state: AnimationState = "  TRUE\tfalse 1  2 10 20   false ".parse().unwrap();

        assert!(state.on);
        assert_eq!(state.direction, Direction::Backward);
        assert_eq!(state.steps, ms(&[10, 20]));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        let cases = [
            "",
            "true true 0",
            "true true 0 0",
            "true true 0 -1 100",
            "true true 0 3 100 200",
            "true true 0 2 100 0",
            "true true 0 2 100 -5",
            "yes true 0 1 100",
            "true true x 1 100",
            "true true -1 1 100",
            "true true 0 1 100 maybe",
        ];

        for case in cases {
            let result = case.parse::<AnimationState>();
            assert!(
                matches!(result, Err(AnimationError::InvalidSaveString(_))),
                "{case:?} should fail, got {result:?}"
            );
        }
    }

    #[test]
    fn direction_round_trips_through_bool() {
        for direction in [Direction::Forward, Direction::Backward] {
            assert_eq!(Direction::from_forward(direction.is_forward()), direction);
            assert_ne!(direction.reversed(), direction);
        }
    }
}
