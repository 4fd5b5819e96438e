use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Performance tier requested from the cluster-control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleLevel {
    Light,
    Standard,
    Maximum,
}

impl ScaleLevel {
    pub const ALL: [ScaleLevel; 3] = [ScaleLevel::Light, ScaleLevel::Standard, ScaleLevel::Maximum];

    /// Wire value sent as `scale_level`.
    pub fn as_wire_str(self) -> &'static str {
        match self {
            ScaleLevel::Light => "LIGHT",
            ScaleLevel::Standard => "STANDARD",
            ScaleLevel::Maximum => "MAXIMUM",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ScaleLevel::Light => ScaleLevel::Standard,
            ScaleLevel::Standard => ScaleLevel::Maximum,
            ScaleLevel::Maximum => ScaleLevel::Maximum,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ScaleLevel::Light => ScaleLevel::Light,
            ScaleLevel::Standard => ScaleLevel::Light,
            ScaleLevel::Maximum => ScaleLevel::Standard,
        }
    }
}

impl fmt::Display for ScaleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

impl FromStr for ScaleLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIGHT" => Ok(ScaleLevel::Light),
            "STANDARD" => Ok(ScaleLevel::Standard),
            "MAXIMUM" | "MAX" => Ok(ScaleLevel::Maximum),
            other => Err(format!(
                "unknown scale level '{other}' (expected LIGHT, STANDARD or MAXIMUM)"
            )),
        }
    }
}

/// Which request body the cluster-control endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestShape {
    /// `{scale_level, hours_to_expire}`
    Level,
    /// `{scale_size, hours_to_expire}`
    Size,
    /// `{}`
    Empty,
}

impl FromStr for RequestShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" => Ok(RequestShape::Level),
            "size" => Ok(RequestShape::Size),
            "empty" => Ok(RequestShape::Empty),
            other => Err(format!(
                "unknown request shape '{other}' (expected level, size or empty)"
            )),
        }
    }
}

/// How long a scale-out stays active before it expires on the server.
///
/// Kept in whole minutes so fractional hours such as 1/6 stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DurationHours {
    minutes: u32,
}

impl DurationHours {
    pub const fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Convert fractional hours, rounding to the nearest minute.
    pub fn from_hours(hours: f64) -> Option<Self> {
        if !hours.is_finite() || hours <= 0.0 {
            return None;
        }
        let minutes = (hours * 60.0).round();
        if minutes < 1.0 || minutes > u32::MAX as f64 {
            return None;
        }
        Some(Self {
            minutes: minutes as u32,
        })
    }

    /// Only whole, non-zero minute durations are accepted.
    pub fn from_duration(d: Duration) -> Option<Self> {
        if d.subsec_nanos() != 0 || d.as_secs() % 60 != 0 {
            return None;
        }
        let minutes = u32::try_from(d.as_secs() / 60).ok()?;
        (minutes > 0).then_some(Self { minutes })
    }

    pub fn minutes(self) -> u32 {
        self.minutes
    }

    pub fn hours(self) -> f64 {
        f64::from(self.minutes) / 60.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.minutes) * 60)
    }
}

impl FromStr for DurationHours {
    type Err = String;

    /// Plain numbers are hours (`0.5`, `2`); anything else goes through humantime (`10m`, `2h`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(hours) = s.parse::<f64>() {
            return DurationHours::from_hours(hours)
                .ok_or_else(|| format!("duration must be at least one minute, got '{s}'"));
        }
        let d = humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}"))?;
        DurationHours::from_duration(d)
            .ok_or_else(|| format!("duration must be a whole number of minutes, got '{s}'"))
    }
}

impl fmt::Display for DurationHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.as_duration()))
    }
}

impl Serialize for DurationHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.hours())
    }
}

impl<'de> Deserialize<'de> for DurationHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hours(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Hours(h) => DurationHours::from_hours(h)
                .ok_or_else(|| D::Error::custom(format!("invalid duration of {h} hours"))),
            Raw::Text(s) => s.parse().map_err(D::Error::custom),
        }
    }
}

/// Request parameters; exactly one shape is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleParams {
    Level(ScaleLevel),
    Size(u32),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleoutRequest {
    pub params: ScaleParams,
    pub duration: DurationHours,
}

/// JSON body of `POST /api/trino/scaleout`. Fields of inactive shapes are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleoutBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_level: Option<ScaleLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_to_expire: Option<f64>,
}

impl ScaleoutRequest {
    pub fn body(&self) -> ScaleoutBody {
        let hours = Some(self.duration.hours());
        match self.params {
            ScaleParams::Level(level) => ScaleoutBody {
                scale_level: Some(level),
                scale_size: None,
                hours_to_expire: hours,
            },
            ScaleParams::Size(size) => ScaleoutBody {
                scale_level: None,
                scale_size: Some(size),
                hours_to_expire: hours,
            },
            ScaleParams::Empty => ScaleoutBody {
                scale_level: None,
                scale_size: None,
                hours_to_expire: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleoutResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scale_size: Option<u32>,
    #[serde(default)]
    pub scale_level: Option<String>,
    #[serde(default)]
    pub expire_at: Option<String>,
    #[serde(default)]
    pub redis_list_length: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Idle,
    AwaitingConfirmation,
    Submitting,
    Succeeded,
    Failed,
    Closed,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowStatus::Idle => "idle",
            FlowStatus::AwaitingConfirmation => "awaiting confirmation",
            FlowStatus::Submitting => "submitting",
            FlowStatus::Succeeded => "succeeded",
            FlowStatus::Failed => "failed",
            FlowStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Success,
    Error,
}

/// One-line notification surfaced by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// Final state of a flow, returned by the controller once it closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowReport {
    pub status: FlowStatus,
    /// Status the flow was in right before closing.
    pub outcome: FlowStatus,
    pub submissions: u32,
    pub last_request: Option<ScaleoutBody>,
    pub response: Option<ScaleoutResponse>,
    pub error: Option<String>,
}

/// Events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    Updated(Box<crate::flow::FlowView>),
    Toast(Toast),
    SuccessPanel { message: String, closes_in: Duration },
    Info(String),
    Closed(Box<FlowReport>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parses_hours_and_humantime() {
        assert_eq!("2".parse::<DurationHours>().unwrap().minutes(), 120);
        assert_eq!("0.5".parse::<DurationHours>().unwrap().minutes(), 30);
        assert_eq!("10m".parse::<DurationHours>().unwrap().minutes(), 10);
        assert_eq!("24h".parse::<DurationHours>().unwrap().minutes(), 1440);
        assert!("0".parse::<DurationHours>().is_err());
        assert!("-1".parse::<DurationHours>().is_err());
        assert!("90s".parse::<DurationHours>().is_err());
        assert!("soon".parse::<DurationHours>().is_err());
    }

    #[test]
    fn one_sixth_hour_is_ten_minutes() {
        let d = DurationHours::from_hours(1.0 / 6.0).unwrap();
        assert_eq!(d.minutes(), 10);
    }

    #[test]
    fn level_body_omits_size() {
        let req = ScaleoutRequest {
            params: ScaleParams::Level(ScaleLevel::Standard),
            duration: DurationHours::from_minutes(120),
        };
        let json = serde_json::to_value(req.body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"scale_level": "STANDARD", "hours_to_expire": 2.0})
        );
    }

    #[test]
    fn size_body_omits_level() {
        let req = ScaleoutRequest {
            params: ScaleParams::Size(20),
            duration: DurationHours::from_minutes(30),
        };
        let json = serde_json::to_value(req.body()).unwrap();
        assert_eq!(json, serde_json::json!({"scale_size": 20, "hours_to_expire": 0.5}));
    }

    #[test]
    fn empty_body_is_empty_object() {
        let req = ScaleoutRequest {
            params: ScaleParams::Empty,
            duration: DurationHours::from_minutes(60),
        };
        assert_eq!(serde_json::to_string(&req.body()).unwrap(), "{}");
    }

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!("light".parse::<ScaleLevel>().unwrap(), ScaleLevel::Light);
        assert_eq!("MAXIMUM".parse::<ScaleLevel>().unwrap(), ScaleLevel::Maximum);
        assert!("huge".parse::<ScaleLevel>().is_err());
        assert_eq!(ScaleLevel::Maximum.next(), ScaleLevel::Maximum);
        assert_eq!(ScaleLevel::Light.prev(), ScaleLevel::Light);
    }
}
