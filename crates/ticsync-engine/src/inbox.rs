//! Remote participants' production cursors and the write path the
//! network link uses to fill their ring slots.

use ticsync_core::{
    CommandInbox, CommandRecord, ParticipantId, SessionError, StepId, MAX_PARTICIPANTS,
};

use crate::ring::StepRing;

/// Per-participant receive cursors and membership.
///
/// `received[p]` is the next produced unit expected from remote
/// participant `p`. The local slot's entry is unused; the local cursor
/// lives in the command builder.
#[derive(Clone, Debug)]
pub struct ParticipantCursors {
    received: [u64; MAX_PARTICIPANTS],
    active: [bool; MAX_PARTICIPANTS],
    local: ParticipantId,
}

impl ParticipantCursors {
    /// Start every cursor at zero with `active` as the membership.
    pub fn new(active: [bool; MAX_PARTICIPANTS], local: ParticipantId) -> Self {
        Self {
            received: [0; MAX_PARTICIPANTS],
            active,
            local,
        }
    }

    /// Whether `participant` is still part of the session.
    pub fn is_active(&self, participant: ParticipantId) -> bool {
        participant.is_valid() && self.active[participant.index()]
    }

    /// Whether any participant is still part of the session.
    pub fn any_active(&self) -> bool {
        self.active.iter().any(|&b| b)
    }

    /// Next unit expected from remote `participant`.
    pub fn received(&self, participant: ParticipantId) -> u64 {
        self.received[participant.index()]
    }

    /// The earliest produced unit not yet available from every
    /// contributing remote participant, combined with the local cursor.
    ///
    /// `local_produced` is `None` for an observer. With no contributor at
    /// all the result is `fallback`, so nothing becomes runnable.
    pub fn lowest(&self, local_produced: Option<u64>, fallback: u64) -> u64 {
        (0..MAX_PARTICIPANTS)
            .filter(|&i| i != self.local.index() && self.active[i])
            .map(|i| self.received[i])
            .chain(local_produced)
            .min()
            .unwrap_or(fallback)
    }
}

/// [`CommandInbox`] over the ring and the remote cursors.
///
/// Built for the duration of one [`NetworkLink::poll`](ticsync_core::NetworkLink::poll).
pub struct RemoteInbox<'a> {
    ring: &'a mut StepRing,
    cursors: &'a mut ParticipantCursors,
    consumed_units: u64,
}

impl<'a> RemoteInbox<'a> {
    /// Borrow the ring and cursors; deliveries must land below
    /// `consumed_units + capacity`.
    pub fn new(
        ring: &'a mut StepRing,
        cursors: &'a mut ParticipantCursors,
        consumed_units: u64,
    ) -> Self {
        Self {
            ring,
            cursors,
            consumed_units,
        }
    }
}

impl CommandInbox for RemoteInbox<'_> {
    fn deliver(
        &mut self,
        participant: ParticipantId,
        step: StepId,
        command: CommandRecord,
    ) -> Result<(), SessionError> {
        let refuse = |reason| SessionError::InvalidDelivery {
            participant,
            step,
            reason,
        };
        if !participant.is_valid() {
            return Err(refuse("unknown participant slot"));
        }
        if participant == self.cursors.local {
            return Err(refuse("slot belongs to the local participant"));
        }
        if !self.cursors.active[participant.index()] {
            return Err(refuse("participant is not active"));
        }
        if step.0 != self.cursors.received[participant.index()] {
            return Err(refuse("out of order"));
        }
        if step.0 >= self.consumed_units + self.ring.capacity() as u64 {
            return Err(refuse("beyond the ring window"));
        }

        self.ring.write(step.0, participant, command);
        self.cursors.received[participant.index()] += 1;
        tracing::trace!(%participant, %step, "remote command delivered");
        Ok(())
    }

    fn remove_participant(&mut self, participant: ParticipantId) {
        if participant.is_valid() && self.cursors.active[participant.index()] {
            self.cursors.active[participant.index()] = false;
            tracing::info!(%participant, "participant left the session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (StepRing, ParticipantCursors) {
        (
            StepRing::new(16),
            ParticipantCursors::new([true, true, false, false], ParticipantId(0)),
        )
    }

    fn cmd(forward: i8) -> CommandRecord {
        CommandRecord {
            forward_move: forward,
            ..CommandRecord::default()
        }
    }

    #[test]
    fn in_order_deliveries_fill_the_ring() {
        let (mut ring, mut cursors) = pair();
        {
            let mut inbox = RemoteInbox::new(&mut ring, &mut cursors, 0);
            inbox.deliver(ParticipantId(1), StepId(0), cmd(1)).unwrap();
            inbox.deliver(ParticipantId(1), StepId(1), cmd(2)).unwrap();
        }
        assert_eq!(cursors.received(ParticipantId(1)), 2);
        assert!(ring.batch(1).in_game[1]);
        assert_eq!(ring.batch(1).commands[1].forward_move, 2);
    }

    #[test]
    fn out_of_order_refused() {
        let (mut ring, mut cursors) = pair();
        let mut inbox = RemoteInbox::new(&mut ring, &mut cursors, 0);
        let err = inbox.deliver(ParticipantId(1), StepId(3), cmd(1)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidDelivery { reason: "out of order", .. }
        ));
    }

    #[test]
    fn local_and_unknown_slots_refused() {
        let (mut ring, mut cursors) = pair();
        let mut inbox = RemoteInbox::new(&mut ring, &mut cursors, 0);
        assert!(inbox.deliver(ParticipantId(0), StepId(0), cmd(1)).is_err());
        assert!(inbox.deliver(ParticipantId(2), StepId(0), cmd(1)).is_err());
        assert!(inbox.deliver(ParticipantId(9), StepId(0), cmd(1)).is_err());
    }

    #[test]
    fn window_is_bounded_by_ring_capacity() {
        let (mut ring, mut cursors) = pair();
        let mut inbox = RemoteInbox::new(&mut ring, &mut cursors, 0);
        for s in 0..16 {
            inbox.deliver(ParticipantId(1), StepId(s), cmd(0)).unwrap();
        }
        let err = inbox.deliver(ParticipantId(1), StepId(16), cmd(0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidDelivery { reason: "beyond the ring window", .. }
        ));
    }

    #[test]
    fn lowest_is_minimum_of_contributors() {
        let (mut ring, mut cursors) = pair();
        {
            let mut inbox = RemoteInbox::new(&mut ring, &mut cursors, 0);
            for s in 0..3 {
                inbox.deliver(ParticipantId(1), StepId(s), cmd(0)).unwrap();
            }
        }
        assert_eq!(cursors.lowest(Some(5), 0), 3);
        assert_eq!(cursors.lowest(Some(2), 0), 2);
        assert_eq!(cursors.lowest(None, 0), 3);
    }

    #[test]
    fn removed_participant_stops_holding_back() {
        let (mut ring, mut cursors) = pair();
        RemoteInbox::new(&mut ring, &mut cursors, 0).remove_participant(ParticipantId(1));
        assert!(!cursors.is_active(ParticipantId(1)));
        assert_eq!(cursors.lowest(Some(4), 0), 4);
        assert_eq!(cursors.lowest(None, 7), 7);
        // The local slot is still active.
        assert!(cursors.any_active());
    }
}
