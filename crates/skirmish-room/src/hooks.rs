//! The room's side of every battle tick.

use skirmish_battle::{
    Action, ActionValidator, BattleError, Battlefield, Resoluble, TickObserver,
};
use skirmish_protocol::{ServerEvent, SessionKey};

use crate::Participant;

/// Observer a [`GameRoom`](crate::GameRoom) hands to
/// [`Battlefield::advance`] for one tick.
///
/// Before resolution it queues the standing attack of every alive unit and
/// runs the validator over the whole queue. After resolution it broadcasts
/// the turn record to both participants.
pub(crate) struct MatchObserver<'a, V> {
    pub(crate) key: &'a SessionKey,
    pub(crate) validator: &'a V,
    pub(crate) participants: &'a [Participant; 2],
}

impl<B, V> TickObserver<B> for MatchObserver<'_, V>
where
    B: Battlefield,
    V: ActionValidator<B>,
{
    fn before_tick(&mut self, battlefield: &mut B) -> Result<(), BattleError> {
        for source in battlefield.alive_entities() {
            battlefield.call_resoluble(Action::Attack { source }, true)?;
        }

        let mut pending = battlefield.take_delayed_resolubles();
        self.validator.prepare(battlefield, &mut pending);
        let mut active: Vec<&mut Resoluble> = pending.iter_mut().filter(|r| r.active).collect();
        self.validator.validate(battlefield, &mut active);

        tracing::trace!(
            room = %self.key,
            pending = pending.len(),
            active = pending.iter().filter(|r| r.active).count(),
            "pre-tick validation"
        );
        battlefield.submit_resolubles(pending);
        Ok(())
    }

    fn after_tick(&mut self, battlefield: &B) -> Result<(), BattleError> {
        let turn = battlefield.serialize_turn()?;
        for participant in self.participants {
            participant.send(ServerEvent::PostTick { turn: turn.clone() });
        }
        Ok(())
    }
}
