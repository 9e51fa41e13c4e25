//! Inbound telephony events
//!
//! The excluded IMS/telephony signalling layer notifies the core through this
//! single enum, applied in the order received per phone. Each variant carries
//! the event's own identity and enumerated values; the time of the event is
//! implicitly "now" as read from the tracker's injected clock. None of the
//! handlers may block or fail back to the caller.

use serde::{Deserialize, Serialize};

use crate::types::{
    AudioCodec, CallDirection, CallId, CallState, CarrierId, Rat, RegState, RoamingType,
    SrvccState,
};

/// One telephony notification consumed by a phone's trackers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelephonyEvent {
    /// A call was dialed or received
    CallStart {
        call_id: CallId,
        direction: CallDirection,
        rat: Rat,
        carrier_id: CarrierId,
        is_emergency: bool,
        is_roaming: bool,
    },

    /// The signalling state of a live call changed
    CallStateChanged { call_id: CallId, state: CallState },

    /// The audio codec in use on a live call changed
    AudioCodecChanged { call_id: CallId, codec: AudioCodec },

    /// Real-time text started on a live call
    RttStarted { call_id: CallId },

    /// SRVCC handover progress; applies to all live IMS-bearer calls
    SrvccStateChanged { state: SrvccState },

    /// The phone-wide voice RAT changed; applies to all live calls
    RatChanged { rat: Rat, carrier_id: CarrierId },

    /// A live call ended
    CallTerminated {
        call_id: CallId,
        reason_code: i32,
        extra_code: i32,
        extra_message: Option<String>,
    },

    /// The network registration tuple changed (or was re-observed)
    ServiceStateChanged(ServiceStateSnapshot),
}

/// Full registration tuple reported by the service-state layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceStateSnapshot {
    pub voice_rat: Rat,
    pub data_rat: Rat,
    pub voice_reg: RegState,
    pub data_reg: RegState,
    pub voice_roaming: RoamingType,
    pub data_roaming: RoamingType,
    pub is_endc: bool,
    pub carrier_id: CarrierId,

    /// An IMS-over-WiFi registration overrides the data RAT to IWLAN and
    /// defeats airplane-mode suppression
    pub wifi_calling_active: bool,
}

impl ServiceStateSnapshot {
    /// Snapshot for a phone in airplane mode with no WiFi-calling override
    pub fn power_off() -> Self {
        Self {
            voice_rat: Rat::Unknown,
            data_rat: Rat::Unknown,
            voice_reg: RegState::PowerOff,
            data_reg: RegState::PowerOff,
            voice_roaming: RoamingType::Unknown,
            data_roaming: RoamingType::Unknown,
            is_endc: false,
            carrier_id: crate::types::CARRIER_ID_UNKNOWN,
            wifi_calling_active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_roundtrip() {
        let event = TelephonyEvent::CallStart {
            call_id: 7,
            direction: CallDirection::Incoming,
            rat: Rat::Lte,
            carrier_id: 1839,
            is_emergency: false,
            is_roaming: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TelephonyEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_power_off_snapshot_has_no_service() {
        let snap = ServiceStateSnapshot::power_off();
        assert_eq!(snap.voice_reg, RegState::PowerOff);
        assert_eq!(snap.data_reg, RegState::PowerOff);
        assert!(!snap.wifi_calling_active);
    }
}
