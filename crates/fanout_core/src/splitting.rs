use crate::contract::{Payload, WorkPacket};

/// Upper bound on payloads one invocation executes itself.
pub const MAX_LOCAL_CLAIMS: usize = 2;

/// Outcome of splitting one packet: what runs here and what is delegated.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    /// Payloads claimed by the current invocation, in the order they were
    /// taken off the end of the list.
    pub local: Vec<Payload>,
    pub delegated: Option<(WorkPacket, WorkPacket)>,
}

pub fn split_packet(packet: WorkPacket) -> SplitPlan {
    let WorkPacket {
        protocol,
        raw_request,
        mut payloads,
    } = packet;

    let mut local = Vec::with_capacity(MAX_LOCAL_CLAIMS);
    let Some(claimed) = payloads.pop() else {
        return SplitPlan {
            local,
            delegated: None,
        };
    };
    local.push(claimed);

    // A single leftover is claimed outright; otherwise an odd leftover gives
    // one more to this invocation so the remainder halves cleanly.
    if payloads.len() == 1 || payloads.len() % 2 == 1 {
        if let Some(extra) = payloads.pop() {
            local.push(extra);
        }
    }

    if payloads.is_empty() {
        return SplitPlan {
            local,
            delegated: None,
        };
    }

    let (first, second) = halve(payloads);
    let delegated = (
        WorkPacket {
            protocol,
            raw_request: raw_request.clone(),
            payloads: first,
        },
        WorkPacket {
            protocol,
            raw_request,
            payloads: second,
        },
    );

    SplitPlan {
        local,
        delegated: Some(delegated),
    }
}

/// Splits into `[0, len/2)` and `[len/2, len)`; the second half takes the
/// extra element of an odd-length list.
pub fn halve<T>(mut items: Vec<T>) -> (Vec<T>, Vec<T>) {
    let second = items.split_off(items.len() / 2);
    (items, second)
}
