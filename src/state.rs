use crate::error::{CalaosError, Result};

/// Number of clicks reported by a multi-click switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickCount {
    None,
    Single,
    Double,
    Triple,
}

impl ClickCount {
    fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(ClickCount::None),
            1 => Some(ClickCount::Single),
            2 => Some(ClickCount::Double),
            3 => Some(ClickCount::Triple),
            _ => None,
        }
    }

    /// Wire ordinal of this value
    pub fn ordinal(self) -> u8 {
        match self {
            ClickCount::None => 0,
            ClickCount::Single => 1,
            ClickCount::Double => 2,
            ClickCount::Triple => 3,
        }
    }
}

/// Press duration reported by a long-press switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDuration {
    None,
    Short,
    Long,
}

impl ClickDuration {
    fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(ClickDuration::None),
            1 => Some(ClickDuration::Short),
            2 => Some(ClickDuration::Long),
            _ => None,
        }
    }

    /// Wire ordinal of this value
    pub fn ordinal(self) -> u8 {
        match self {
            ClickDuration::None => 0,
            ClickDuration::Short => 1,
            ClickDuration::Long => 2,
        }
    }
}

/// Motion reported by a smart shutter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterAction {
    /// Not moving; the wire encodes this as an empty action token
    Stationary,
    Up,
    Down,
    Stop,
    Calibrate,
}

impl ShutterAction {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(ShutterAction::Stationary),
            "up" => Some(ShutterAction::Up),
            "down" => Some(ShutterAction::Down),
            "stop" => Some(ShutterAction::Stop),
            "calibrate" => Some(ShutterAction::Calibrate),
            _ => None,
        }
    }

    /// Wire token of this action
    pub fn token(self) -> &'static str {
        match self {
            ShutterAction::Stationary => "",
            ShutterAction::Up => "up",
            ShutterAction::Down => "down",
            ShutterAction::Stop => "stop",
            ShutterAction::Calibrate => "calibrate",
        }
    }
}

/// Canonical translated state of an item
///
/// The concrete variant is determined by the item's wire type through its
/// [`Translator`]; structural equality between two values of the same
/// variant is the sole basis for change detection.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Bool(bool),
    /// Percentage level, clamped into 0..=100
    Percent(u8),
    Clicks(ClickCount),
    Press(ClickDuration),
    Shutter {
        action: ShutterAction,
        position: i32,
    },
    Float(f64),
    Int(i64),
    /// Free-form wire string, used by string items and unknown types
    Text(String),
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateValue::Bool(v) => write!(f, "{v}"),
            StateValue::Percent(v) => write!(f, "{v}%"),
            StateValue::Clicks(v) => write!(f, "{v:?}"),
            StateValue::Press(v) => write!(f, "{v:?}"),
            StateValue::Shutter { action, position } => {
                write!(f, "{action:?} at {position}%")
            }
            StateValue::Float(v) => write!(f, "{v}"),
            StateValue::Int(v) => write!(f, "{v}"),
            StateValue::Text(v) => f.write_str(v),
        }
    }
}

/// Translation strategy between raw wire strings and [`StateValue`]s
///
/// Selected once per item by exact match on the declared wire type;
/// unknown types degrade to `Passthrough`, which never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translator {
    /// `"true"`/`"false"` switches, scenarios, time ranges
    Binary,
    /// Dimmer-style percentage, clamped into 0..=100
    Percentage,
    /// Multi-click switch ordinal, 0..=3
    Clicks,
    /// Long-press switch ordinal, 0..=2
    Presses,
    /// Smart shutter `<action> <position>` pair
    Shutter,
    /// Floating-point sensor reading
    Analog,
    /// Integer register
    Counter,
    /// Raw string, the default for unrecognized types
    Passthrough,
}

impl Translator {
    /// Look up the strategy for a declared wire type
    pub fn for_type(wire_type: &str) -> Translator {
        match wire_type {
            "InPlageHoraire" => Translator::Binary,
            "InputTime" => Translator::Binary,
            "InputTimer" => Translator::Binary,
            "InternalBool" => Translator::Binary,
            "InternalInt" => Translator::Counter,
            "InternalString" => Translator::Passthrough,
            "Scenario" => Translator::Binary,
            "WebInputAnalog" => Translator::Analog,
            "WebInputString" => Translator::Passthrough,
            "WebInputTemp" => Translator::Analog,
            "WIDigitalBP" => Translator::Binary,
            "WIDigitalLong" => Translator::Presses,
            "WIDigitalTriple" => Translator::Clicks,
            "WODali" => Translator::Percentage,
            "WODigital" => Translator::Binary,
            "WOVoletSmart" => Translator::Shutter,
            _ => Translator::Passthrough,
        }
    }

    /// Convert a raw wire string into canonical typed form
    pub fn parse(self, raw: &str) -> Result<StateValue> {
        match self {
            Translator::Binary => Ok(StateValue::Bool(raw == "true")),
            Translator::Percentage => parse_percent(raw),
            Translator::Clicks => {
                let ordinal = parse_int(raw, "click count")?;
                ClickCount::from_ordinal(ordinal)
                    .map(StateValue::Clicks)
                    .ok_or_else(|| invalid(raw, "click count"))
            }
            Translator::Presses => {
                let ordinal = parse_int(raw, "click duration")?;
                ClickDuration::from_ordinal(ordinal)
                    .map(StateValue::Press)
                    .ok_or_else(|| invalid(raw, "click duration"))
            }
            Translator::Shutter => parse_shutter(raw),
            Translator::Analog => raw
                .parse::<f64>()
                .map(StateValue::Float)
                .map_err(|_| invalid(raw, "analog")),
            Translator::Counter => parse_int(raw, "counter").map(StateValue::Int),
            Translator::Passthrough => Ok(StateValue::Text(raw.to_string())),
        }
    }

    /// Encode a canonical value back to its wire string
    ///
    /// Input-only types never take the outbound path, but every variant
    /// still has a defined rendering so the encoding is total.
    pub fn encode(self, value: &StateValue) -> String {
        match value {
            StateValue::Bool(v) => v.to_string(),
            StateValue::Percent(v) => v.to_string(),
            StateValue::Clicks(v) => v.ordinal().to_string(),
            StateValue::Press(v) => v.ordinal().to_string(),
            StateValue::Shutter { action, position } => match action {
                ShutterAction::Stationary => position.to_string(),
                _ => format!("{} {}", action.token(), position),
            },
            StateValue::Float(v) => v.to_string(),
            StateValue::Int(v) => v.to_string(),
            StateValue::Text(v) => v.clone(),
        }
    }
}

fn invalid(raw: &str, expected: &'static str) -> CalaosError {
    CalaosError::InvalidState {
        expected,
        value: raw.to_string(),
    }
}

fn parse_int(raw: &str, expected: &'static str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| invalid(raw, expected))
}

/// Dimmers report plain integers but switch-style transitions can surface
/// as `"true"`/`"false"`; out-of-range integers clamp to the nearest bound.
fn parse_percent(raw: &str) -> Result<StateValue> {
    let value = match raw {
        "true" => 100,
        "false" => 0,
        _ => parse_int(raw, "percentage")?.clamp(0, 100) as u8,
    };
    Ok(StateValue::Percent(value))
}

/// A shutter state is `<action> <position>`; a bare integer means the
/// shutter is stationary at that position (the empty action token cannot
/// survive whitespace splitting).
fn parse_shutter(raw: &str) -> Result<StateValue> {
    let mut tokens = raw.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(first), None, _) => {
            let position = first.parse::<i32>().map_err(|_| invalid(raw, "shutter"))?;
            Ok(StateValue::Shutter {
                action: ShutterAction::Stationary,
                position,
            })
        }
        (Some(first), Some(second), None) => {
            let action = ShutterAction::from_token(first).ok_or_else(|| invalid(raw, "shutter"))?;
            let position = second.parse::<i32>().map_err(|_| invalid(raw, "shutter"))?;
            Ok(StateValue::Shutter { action, position })
        }
        _ => Err(invalid(raw, "shutter")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_clamps_into_range() {
        for (raw, expected) in [
            ("-20", 0),
            ("-1", 0),
            ("0", 0),
            ("42", 42),
            ("100", 100),
            ("101", 100),
            ("1000", 100),
        ] {
            assert_eq!(
                Translator::Percentage.parse(raw).unwrap(),
                StateValue::Percent(expected),
                "raw {raw:?}"
            );
        }
    }

    #[test]
    fn percentage_accepts_switch_transitions() {
        assert_eq!(
            Translator::Percentage.parse("true").unwrap(),
            StateValue::Percent(100)
        );
        assert_eq!(
            Translator::Percentage.parse("false").unwrap(),
            StateValue::Percent(0)
        );
        assert!(Translator::Percentage.parse("bright").is_err());
    }

    #[test]
    fn binary_parses_true_and_everything_else_as_false() {
        assert_eq!(Translator::Binary.parse("true").unwrap(), StateValue::Bool(true));
        assert_eq!(Translator::Binary.parse("false").unwrap(), StateValue::Bool(false));
        assert_eq!(Translator::Binary.parse("").unwrap(), StateValue::Bool(false));
    }

    #[test]
    fn ordinals_out_of_range_are_errors_not_clamps() {
        assert_eq!(
            Translator::Clicks.parse("3").unwrap(),
            StateValue::Clicks(ClickCount::Triple)
        );
        assert!(Translator::Clicks.parse("4").is_err());
        assert!(Translator::Clicks.parse("-1").is_err());

        assert_eq!(
            Translator::Presses.parse("2").unwrap(),
            StateValue::Press(ClickDuration::Long)
        );
        assert!(Translator::Presses.parse("3").is_err());
    }

    #[test]
    fn shutter_parses_action_and_bare_position() {
        assert_eq!(
            Translator::Shutter.parse("up 30").unwrap(),
            StateValue::Shutter {
                action: ShutterAction::Up,
                position: 30
            }
        );
        assert_eq!(
            Translator::Shutter.parse("55").unwrap(),
            StateValue::Shutter {
                action: ShutterAction::Stationary,
                position: 55
            }
        );
        assert!(Translator::Shutter.parse("sideways 10").is_err());
        assert!(Translator::Shutter.parse("up down 10").is_err());
        assert!(Translator::Shutter.parse("").is_err());
    }

    #[test]
    fn round_trips_where_the_wire_format_round_trips() {
        let cases = [
            (Translator::Binary, StateValue::Bool(true)),
            (Translator::Binary, StateValue::Bool(false)),
            (Translator::Percentage, StateValue::Percent(0)),
            (Translator::Percentage, StateValue::Percent(73)),
            (Translator::Percentage, StateValue::Percent(100)),
            (Translator::Clicks, StateValue::Clicks(ClickCount::Double)),
            (Translator::Presses, StateValue::Press(ClickDuration::Short)),
            (
                Translator::Shutter,
                StateValue::Shutter {
                    action: ShutterAction::Down,
                    position: 12,
                },
            ),
            (
                Translator::Shutter,
                StateValue::Shutter {
                    action: ShutterAction::Stationary,
                    position: 80,
                },
            ),
        ];
        for (translator, value) in cases {
            assert_eq!(
                translator.parse(&translator.encode(&value)).unwrap(),
                value
            );
        }
    }

    #[test]
    fn passthrough_is_the_identity() {
        for raw in ["", "hello", "42", "true"] {
            assert_eq!(
                Translator::Passthrough.parse(raw).unwrap(),
                StateValue::Text(raw.to_string())
            );
            assert_eq!(
                Translator::Passthrough.encode(&StateValue::Text(raw.to_string())),
                raw
            );
        }
    }

    #[test]
    fn unknown_types_fall_back_to_passthrough() {
        assert_eq!(Translator::for_type("WODali"), Translator::Percentage);
        assert_eq!(Translator::for_type("Scenario"), Translator::Binary);
        assert_eq!(Translator::for_type("SomethingNew"), Translator::Passthrough);
        assert_eq!(Translator::for_type(""), Translator::Passthrough);
    }
}
