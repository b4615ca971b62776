use bitflags::bitflags;

use crate::log;

bitflags! {
    /// Status bits of a [`Slot`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Status: u8 {
        /// The slot holds a live request.
        const IN_USE = 0b0001;
        /// The request has been sent and is waiting for its acknowledgement.
        const PENDING = 0b0010;
        /// The request is a SUBSCRIBE (only meaningful together with `IN_USE`).
        const SUBSCRIBE = 0b0100;
        /// The request is an UNSUBSCRIBE (only meaningful together with `IN_USE`).
        const UNSUBSCRIBE = 0b1000;
    }
}

/// A single outstanding request: a QoS 1/2 publish, a subscribe or an unsubscribe, tracked from
/// the moment it is encoded until its acknowledgement (or a close fanout) frees the slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slot {
    status: Status,
    packet_id: u16,
    arg: usize,
    timeout_start: u32,
    expected_sent_len: usize,
}

impl Slot {
    pub fn packet_id(&self) -> u16 {
        self.packet_id
    }

    pub fn arg(&self) -> usize {
        self.arg
    }

    pub fn expected_sent_len(&self) -> usize {
        self.expected_sent_len
    }

    pub fn is_subscribe(&self) -> bool {
        self.status.contains(Status::SUBSCRIBE)
    }

    pub fn is_unsubscribe(&self) -> bool {
        self.status.contains(Status::UNSUBSCRIBE)
    }

    pub fn is_pending(&self) -> bool {
        self.status.contains(Status::PENDING)
    }

    /// Tick at which the slot entered `PENDING`, for a future watchdog to consult.
    pub fn timeout_start(&self) -> u32 {
        self.timeout_start
    }
}

/// A fixed-size slab of [`Slot`]s, keyed by MQTT packet id.
///
/// `N` bounds the number of requests in flight simultaneously; a full table causes new
/// subscribe/unsubscribe/QoS publish calls to fail with `RequestTableFull` rather than growing
/// unboundedly.
#[derive(Debug)]
pub struct RequestTable<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> Default for RequestTable<N> {
    fn default() -> Self {
        Self {
            slots: [Slot::default(); N],
        }
    }
}

impl<const N: usize> RequestTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a slot for `packet_id`, returning its index, or `None` if the table is full.
    pub fn create(
        &mut self,
        packet_id: u16,
        arg: usize,
        expected_sent_len: usize,
    ) -> Option<usize> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| !slot.status.contains(Status::IN_USE))?;

        *slot = Slot {
            status: Status::IN_USE,
            packet_id,
            arg,
            timeout_start: 0,
            expected_sent_len,
        };

        Some(index)
    }

    pub fn mark_subscribe(&mut self, index: usize) {
        self.slots[index].status.insert(Status::SUBSCRIBE);
    }

    pub fn mark_unsubscribe(&mut self, index: usize) {
        self.slots[index].status.insert(Status::UNSUBSCRIBE);
    }

    pub fn set_pending(&mut self, index: usize, timeout_start: u32) {
        let slot = &mut self.slots[index];
        slot.status.insert(Status::PENDING);
        slot.timeout_start = timeout_start;
    }

    pub fn get_pending(&self, packet_id: u16) -> Option<&Slot> {
        self.slots.iter().find(|slot| {
            slot.status.contains(Status::IN_USE | Status::PENDING) && slot.packet_id == packet_id
        })
    }

    /// QoS 0 publishes share packet id 0 and carry no acknowledgement, so completion is
    /// detected by comparing `sent_total` against the byte offset recorded at encode time
    /// instead of matching a packet id. Resolves (and frees) the oldest one still pending, if
    /// any has now been fully handed to the transport.
    pub fn complete_zero_qos(&mut self, sent_total: usize) -> Option<usize> {
        let slot = self
            .slots
            .iter_mut()
            .filter(|slot| {
                slot.status.contains(Status::IN_USE | Status::PENDING)
                    && slot.packet_id == 0
                    && slot.expected_sent_len <= sent_total
            })
            .min_by_key(|slot| slot.expected_sent_len)?;

        let arg = slot.arg;
        *slot = Slot::default();
        Some(arg)
    }

    pub fn delete(&mut self, packet_id: u16) {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.status.contains(Status::IN_USE) && slot.packet_id == packet_id)
        {
            *slot = Slot::default();
        } else {
            log::warn_!("attempted to delete unknown packet id {packet_id}");
        }
    }

    /// Iterates over every slot currently in use, in slot order, for close fanout.
    pub fn iter_in_use(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .iter()
            .filter(|slot| slot.status.contains(Status::IN_USE))
    }

    /// Zeros every slot. Used on transport close.
    pub fn clear(&mut self) {
        self.slots = [Slot::default(); N];
    }
}
