//! Default legality rules for pending actions.

use std::collections::HashSet;

use skirmish_protocol::Vector;

use crate::{Action, ActionValidator, Battlefield, EntityId, Resoluble};

/// Grid rules: one step per unit per tick, no two units on one cell.
///
/// Preparation:
/// - actions whose source is missing or dead are deactivated;
/// - only the last submitted move per unit survives, and only the first
///   attack;
/// - moves resolve before attacks, ties broken by source id.
///
/// Validation deactivates moves that leave the grid, go further than one
/// cell, or target a cell that is occupied or already claimed this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridValidator;

impl<B: Battlefield + ?Sized> ActionValidator<B> for GridValidator {
    fn prepare(&self, battlefield: &B, pending: &mut Vec<Resoluble>) {
        let mut seen_moves: HashSet<EntityId> = HashSet::new();
        let mut seen_attacks: HashSet<EntityId> = HashSet::new();

        // Walk moves newest-first so the latest one wins; attacks keep the first.
        for resoluble in pending.iter_mut().rev() {
            if let Action::Move { source, .. } = resoluble.action {
                if !seen_moves.insert(source) {
                    resoluble.deactivate();
                }
            }
        }
        for resoluble in pending.iter_mut() {
            let source = resoluble.action.source();
            let alive = battlefield.entity(source).is_some_and(|e| e.alive);
            if !alive {
                resoluble.deactivate();
                continue;
            }
            if matches!(resoluble.action, Action::Attack { .. }) && !seen_attacks.insert(source) {
                resoluble.deactivate();
            }
        }

        pending.sort_by_key(|r| (r.action.priority(), r.action.source()));
    }

    fn validate(&self, battlefield: &B, active: &mut [&mut Resoluble]) {
        let mut claimed: HashSet<Vector> = HashSet::new();

        for resoluble in active.iter_mut() {
            let Action::Move { source, to } = resoluble.action else {
                continue;
            };
            let Some(mover) = battlefield.entity(source) else {
                resoluble.deactivate();
                continue;
            };

            let legal = battlefield.in_bounds(to)
                && mover.position.chebyshev(to) == 1
                && battlefield.occupant(to).is_none()
                && claimed.insert(to);
            if !legal {
                tracing::debug!(%source, %to, "move rejected");
                resoluble.deactivate();
            }
        }
    }
}
