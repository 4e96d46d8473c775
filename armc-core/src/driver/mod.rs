//! §4.6 ARMC driver: the CEGAR loop itself. Setup merges alphabets and
//! builds `τ`/`τ⁻¹`; the outer loop alternates a forward fixed-point search
//! with counterexample replay and refinement until the property is proven,
//! a real violation is found, or the configured timeout elapses.

use std::time::{Duration, Instant};

use crate::abstraction::Abstraction;
use crate::alphabet::AlgebraRegistry;
use crate::error::ArmcError;
use crate::sfa::{Equivalence, Sfa};
use crate::sft::Sft;

/// Which side of the product the driver searches from (§4.6 step 5: if
/// Backward, `Init`/`Bad` and `τ`/`τ⁻¹` are swapped once at setup and the
/// rest of the loop proceeds identically).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationDirection {
    Forward,
    Backward,
}

/// The result of a complete verification run.
pub enum VerifyResult {
    Holds,
    Violated(Counterexample),
}

/// A reconstructed error trace: the sequence of configurations from `Init`
/// to the discovered bad configuration, assembled from the reversed replay
/// sequence plus the trailing pair `(Mℓ, _)` (§4.6 Decision).
pub struct Counterexample {
    pub trace: Vec<Sfa>,
    pub loop_index: usize,
}

/// One `(Mᵢ, Mᵢ^α)` pair recorded by the inner forward phase.
struct Recorded {
    m: Sfa,
    m_alpha: Sfa,
}

pub struct Driver {
    init: Sfa,
    bad: Sfa,
    tau: Sft,
    tau_inv: Sft,
    abstraction: Box<dyn Abstraction>,
    timeout: Option<Duration>,
    loops: usize,
}

impl Driver {
    /// Setup (§4.6): merges `Init`/`Bad`/`τᵢ` alphabets, unions the
    /// transducers into `τ`, builds `τ⁻¹ = Invert(τ)`, and fails with
    /// [`ArmcError::InitialPropertyViolation`] unless `Init ∩ Bad = ∅`.
    /// `direction == Backward` swaps `Init ↔ Bad` and `τ ↔ τ⁻¹` once, here.
    pub fn new(
        init: Sfa,
        bad: Sfa,
        transducers: Vec<Sft>,
        abstraction: Box<dyn Abstraction>,
        direction: ComputationDirection,
        timeout: Option<Duration>,
    ) -> Result<Self, ArmcError> {
        if transducers.is_empty() {
            return Err(ArmcError::NoTransducers);
        }

        let mut alphabet = init.algebra().alphabet().clone();
        alphabet = alphabet.merge(bad.algebra().alphabet());
        for t in &transducers {
            alphabet = alphabet.merge(t.algebra().alphabet());
        }
        let registry = AlgebraRegistry::new();
        let shared = registry.get_or_insert(alphabet);
        log::info!("driver setup: shared alphabet has {} symbols", shared.alphabet().len());

        let init = init.rebind(&shared);
        let bad = bad.rebind(&shared);
        let transducers: Vec<Sft> = transducers.iter().map(|t| t.rebind(&shared)).collect();

        let tau = Sft::union(&transducers).expect("every transducer was just rebound onto the shared algebra");
        let tau_inv = tau.invert();

        let (init, bad, tau, tau_inv) = match direction {
            ComputationDirection::Forward => (init, bad, tau, tau_inv),
            ComputationDirection::Backward => (bad, init, tau_inv, tau),
        };

        let holds_initially = init
            .product_is_empty(&bad)
            .expect("init and bad share one algebra after rebinding");
        if !holds_initially {
            return Err(ArmcError::InitialPropertyViolation);
        }

        Ok(Self {
            init,
            bad,
            tau,
            tau_inv,
            abstraction,
            timeout,
            loops: 0,
        })
    }

    pub fn loops(&self) -> usize {
        self.loops
    }

    /// Runs the CEGAR loop to completion (or until the configured timeout
    /// elapses).
    pub fn verify(&mut self) -> Result<VerifyResult, ArmcError> {
        let start = Instant::now();
        loop {
            log::info!("outer loop iteration {}", self.loops);
            match self.verify_step(start)? {
                StepOutcome::Holds => return Ok(VerifyResult::Holds),
                StepOutcome::Violated(counterexample) => return Ok(VerifyResult::Violated(counterexample)),
                StepOutcome::Undecided => {
                    self.loops += 1;
                }
            }
        }
    }

    fn check_timeout(&self, start: Instant) -> Result<(), ArmcError> {
        if let Some(budget) = self.timeout {
            if start.elapsed() > budget {
                return Err(ArmcError::Timeout(budget));
            }
        }
        Ok(())
    }

    /// One full `VerifyStep` (§4.6): inner forward phase, then — if it
    /// broke out on a non-empty `M ∩ Bad` — replay/spuriousness and a
    /// refinement decision.
    fn verify_step(&mut self, start: Instant) -> Result<StepOutcome, ArmcError> {
        let mut sequence: Vec<Recorded> = Vec::new();
        let mut m = self.init.clone();
        let mut i = 0usize;

        let x = loop {
            let bad_reached = !m
                .product_is_empty(&self.bad)
                .expect("m and bad share one algebra, established at driver setup");
            if i > 0 && bad_reached {
                let x = m
                    .product(&self.bad)
                    .expect("m and bad share one algebra, established at driver setup")
                    .determinize()
                    .minimize();
                log::debug!("inner step {i}: M ∩ Bad non-empty, breaking to replay");
                break x;
            }

            let m_alpha = self.abstraction.collapse(&m).determinize().minimize();

            if i > 0 {
                let previous = &sequence[i - 1].m_alpha;
                if matches!(m_alpha.equivalent_to(previous), Ok(Equivalence::Equivalent)) {
                    log::info!("fixed point reached after {i} inner steps");
                    return Ok(StepOutcome::Holds);
                }
            }

            self.check_timeout(start)?;
            log::debug!("inner step {i}: |M| = {}, |M^alpha| = {}", m.num_states(), m_alpha.num_states());
            sequence.push(Recorded { m: m.clone(), m_alpha: m_alpha.clone() });
            i += 1;

            m = self
                .tau
                .apply(&m_alpha)
                .expect("tau and m_alpha share one algebra, established at driver setup")
                .determinize()
                .minimize();
        };

        self.replay(sequence, x, i)
    }

    /// Replay / spuriousness phase (§4.6): walks the recorded sequence from
    /// most recent to oldest, pulling `X` back through `τ⁻¹` at each step
    /// and checking whether it has become disjoint from that step's `M`.
    fn replay(&mut self, sequence: Vec<Recorded>, x: Sfa, loop_index: usize) -> Result<StepOutcome, ArmcError> {
        let mut trace = vec![x.clone()];
        let mut current = x;
        let mut spurious = false;

        for recorded in sequence.iter().rev() {
            let pulled_back = self
                .tau_inv
                .apply(&current)
                .expect("tau_inv and current share one algebra, established at driver setup")
                .product(&recorded.m_alpha)
                .expect("both sides share one algebra, established at driver setup")
                .determinize()
                .minimize();
            trace.push(pulled_back.clone());
            current = pulled_back;

            if current
                .product_is_empty(&recorded.m)
                .expect("both sides share one algebra, established at driver setup")
            {
                spurious = true;
                break;
            }
        }

        if spurious {
            let refine_against = sequence.last().map(|r| r.m.clone()).unwrap_or_else(|| self.init.clone());
            self.abstraction.refine(&refine_against, &current);
            Ok(StepOutcome::Undecided)
        } else {
            trace.push(sequence.first().map(|r| r.m.clone()).unwrap_or_else(|| self.init.clone()));
            trace.reverse();
            Ok(StepOutcome::Violated(Counterexample { trace, loop_index }))
        }
    }
}

enum StepOutcome {
    Holds,
    Violated(Counterexample),
    Undecided,
}
