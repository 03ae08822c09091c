// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Staking contract: a 4★/5★ good bought in fixed monthly installments.

use serde::{Deserialize, Serialize};

use crate::core_types::{AgentId, ContractId};
use crate::goods::Good;

/// Lifecycle of a commitment contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractState {
    Proposed,
    Active,
    Completed,
    Cancelled,
}

impl ContractState {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed: terms computed, first installment not yet taken",
            Self::Active => "Active: installments being collected",
            Self::Completed => "Completed: every installment paid, good delivered",
            Self::Cancelled => "Cancelled: holder died, good returned to stock",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Installment terms for a good at a given liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Duration in cycles (12 per star).
    pub duration: u32,
    pub monthly_payment: f64,
    /// `monthly_payment x duration`, booked as engagement debt.
    pub total_value: f64,
}

impl ContractTerms {
    pub fn for_good(good: &Good, liquidity: f64) -> Self {
        let duration = good.tier().commitment_duration();
        let monthly_payment = good.value * liquidity / f64::from(duration);
        Self {
            duration,
            monthly_payment,
            total_value: monthly_payment * f64::from(duration),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentContract {
    pub id: ContractId,
    pub agent: AgentId,
    pub good: Good,
    pub duration: u32,
    pub monthly_payment: f64,
    pub start_cycle: u64,
    pub cycles_paid: u32,
    pub total_value: f64,
    pub state: ContractState,
    /// Installments found unaffordable when due.
    pub missed_payments: u32,
}

impl CommitmentContract {
    /// Contract in the proposed state; nothing has been paid.
    pub fn propose(id: ContractId, agent: AgentId, good: Good, terms: ContractTerms, start_cycle: u64) -> Self {
        Self {
            id,
            agent,
            good,
            duration: terms.duration,
            monthly_payment: terms.monthly_payment,
            start_cycle,
            cycles_paid: 0,
            total_value: terms.total_value,
            state: ContractState::Proposed,
            missed_payments: 0,
        }
    }

    /// Record the first installment and move to active.
    pub fn activate(&mut self) {
        self.cycles_paid = 1;
        self.state = ContractState::Active;
    }

    pub fn elapsed(&self, cycle: u64) -> u64 {
        cycle.saturating_sub(self.start_cycle)
    }

    /// An installment is due exactly when elapsed cycles equal cycles paid.
    pub fn is_payment_due(&self, cycle: u64) -> bool {
        let elapsed = self.elapsed(cycle);
        elapsed > 0 && elapsed == u64::from(self.cycles_paid) && !self.is_fully_paid()
    }

    pub fn is_fully_paid(&self) -> bool {
        self.cycles_paid >= self.duration
    }

    /// A missed installment is never due again, so the contract cannot complete.
    pub fn is_stalled(&self) -> bool {
        self.missed_payments > 0 && !self.is_fully_paid()
    }

    /// Installments still owed.
    pub fn remaining_value(&self) -> f64 {
        f64::from(self.duration.saturating_sub(self.cycles_paid)) * self.monthly_payment
    }
}
