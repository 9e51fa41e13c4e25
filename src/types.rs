//! Domain enums and identifiers shared across the trackers and the store

use serde::{Deserialize, Serialize};

/// Identity of a call, unique among currently-live calls on one phone
pub type CallId = u32;

/// Carrier identity as assigned by the carrier id table
pub type CarrierId = i32;

/// Carrier id when the SIM has not resolved to a known carrier
pub const CARRIER_ID_UNKNOWN: CarrierId = -1;

/// Radio access technology a call or data session is using
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rat {
    Unknown,
    Gsm,
    Cdma,
    Umts,
    Hspa,
    Lte,
    Nr,
    Iwlan,
}

impl Rat {
    /// Whether this RAT carries voice over a packet (IMS) bearer
    pub fn is_packet(self) -> bool {
        matches!(self, Rat::Lte | Rat::Nr | Rat::Iwlan)
    }
}

/// Transport carrying a call's voice media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bearer {
    Unknown,
    CircuitSwitched,
    Ims,
}

impl Bearer {
    /// Derive the bearer from the RAT active when the call was observed
    pub fn from_rat(rat: Rat) -> Self {
        match rat {
            Rat::Unknown => Bearer::Unknown,
            r if r.is_packet() => Bearer::Ims,
            _ => Bearer::CircuitSwitched,
        }
    }
}

/// Direction of a call as seen by this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    Outgoing,
    Incoming,
}

/// Signalling states reported for a live call
///
/// Only `Alerting` and `Active` matter to the aggregation core (setup
/// timestamp capture and answered detection); the rest are accepted so the
/// upstream layer can forward its state machine verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    Dialing,
    Incoming,
    Alerting,
    Active,
    Holding,
    Disconnecting,
}

/// SRVCC handover progress reported by the IMS layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SrvccState {
    Started,
    Completed,
    Failed,
    Canceled,
}

/// Network roaming classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoamingType {
    Unknown,
    NotRoaming,
    Domestic,
    International,
}

/// Registration state of a network domain (voice or data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegState {
    InService,
    OutOfService,
    PowerOff,
}

/// Audio codecs observed on a call; each maps to one bit of the session's
/// OR-accumulated codec bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    Unknown = 0,
    Amr = 1,
    AmrWb = 2,
    Evs = 3,
    G711 = 4,
    G722 = 5,
    G729 = 6,
}

impl AudioCodec {
    /// Bit assigned to this codec in a session's codec bitmask
    pub fn bit(self) -> u64 {
        1u64 << (self as u32)
    }
}

/// Bucketed call setup duration
///
/// Classification is a monotonic step function over closed millisecond
/// ranges with no gaps or overlaps; see [`SetupDuration::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SetupDuration {
    Unknown,
    ExtremelyFast,
    UltraFast,
    VeryFast,
    Fast,
    Normal,
    Slow,
    ExtremelySlow,
    UltraSlow,
    VerySlow,
}

/// Upper bounds (exclusive) of each setup-duration bucket, in milliseconds.
/// The last bucket is open-ended.
const SETUP_DURATION_BOUNDS: [(u64, SetupDuration); 9] = [
    (400, SetupDuration::ExtremelyFast),
    (700, SetupDuration::UltraFast),
    (1_000, SetupDuration::VeryFast),
    (1_500, SetupDuration::Fast),
    (2_500, SetupDuration::Normal),
    (4_000, SetupDuration::Slow),
    (6_000, SetupDuration::ExtremelySlow),
    (10_000, SetupDuration::UltraSlow),
    (u64::MAX, SetupDuration::VerySlow),
];

impl SetupDuration {
    /// Classify the elapsed time between call creation and the first
    /// ALERTING/ACTIVE transition
    pub fn classify(elapsed_millis: u64) -> Self {
        for &(bound, bucket) in &SETUP_DURATION_BOUNDS {
            if elapsed_millis < bound {
                return bucket;
            }
        }
        SetupDuration::VerySlow
    }
}
