use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::rand::Rng64;

/// The closed function allow-list. Arity is fixed per entry and checked at
/// bind time, so a wrong-arity call never reaches evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
    Log,
    Exp,
    Pow,
    Min,
    Max,
    Rand,
    RandInt,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "log" => Self::Log,
            "exp" => Self::Exp,
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            "rand" => Self::Rand,
            "randint" => Self::RandInt,
            _ => return None,
        })
    }

    pub(crate) fn arity(self) -> usize {
        match self {
            Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Sqrt
            | Self::Abs
            | Self::Floor
            | Self::Ceil
            | Self::Round
            | Self::Log
            | Self::Exp => 1,
            Self::Pow | Self::Min | Self::Max | Self::RandInt => 2,
            Self::Rand => 0,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Pow => "pow",
            Self::Min => "min",
            Self::Max => "max",
            Self::Rand => "rand",
            Self::RandInt => "randint",
        }
    }

    /// Dispatch with already-evaluated arguments; `args.len()` matches
    /// [`Builtin::arity`] by construction.
    pub(crate) fn call(self, args: &[f64], rng: &mut Rng64) -> KeysplineResult<f64> {
        Ok(match self {
            Self::Sin => args[0].sin(),
            Self::Cos => args[0].cos(),
            Self::Tan => args[0].tan(),
            Self::Sqrt => args[0].sqrt(),
            Self::Abs => args[0].abs(),
            Self::Floor => args[0].floor(),
            Self::Ceil => args[0].ceil(),
            Self::Round => args[0].round(),
            Self::Log => args[0].ln(),
            Self::Exp => args[0].exp(),
            Self::Pow => args[0].powf(args[1]),
            Self::Min => args[0].min(args[1]),
            Self::Max => args[0].max(args[1]),
            Self::Rand => rng.next_f64_01(),
            Self::RandInt => {
                let lo = args[0].floor();
                let hi = args[1].floor();
                if !lo.is_finite() || !hi.is_finite() || lo > hi {
                    return Err(KeysplineError::evaluation(format!(
                        "randint bounds [{}, {}] are invalid",
                        args[0], args[1]
                    )));
                }
                // Inclusive integer range.
                let span = (hi - lo) + 1.0;
                lo + (rng.next_f64_01() * span).floor().min(span - 1.0)
            }
        })
    }
}
