//! The per-stream body state machine: a deterministic, idempotent pure
//! function from `(IndexPolicy, current state, end_of_essence)` to the next
//! state.

/// Which optional index-bearing states a stream's policy requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    CbrInHeader,
    CbrInHeaderIsolated,
    CbrPreBody,
    CbrInBody,
    CbrIsolated,
    CbrFooter,
    CbrFooterIsolated,
    VbrSprinkled,
    VbrSprinkledIsolated,
    VbrSparseFooter,
    VbrFullFooter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyState {
    Start,
    HeadIndex,
    PreBodyIndex,
    BodyWithIndex,
    BodyNoIndex,
    PostBodyIndex,
    FootIndex,
    Done,
}

struct Shape {
    head_index: bool,
    pre_body_index: bool,
    body_carries_index: bool,
    foot_index: bool,
}

impl IndexPolicy {
    fn shape(self) -> Shape {
        use IndexPolicy::*;
        match self {
            CbrInHeader | CbrInHeaderIsolated => Shape {
                head_index: true,
                pre_body_index: false,
                body_carries_index: false,
                foot_index: false,
            },
            CbrPreBody => Shape {
                head_index: false,
                pre_body_index: true,
                body_carries_index: false,
                foot_index: false,
            },
            CbrInBody | CbrIsolated | VbrSprinkled | VbrSprinkledIsolated => Shape {
                head_index: false,
                pre_body_index: false,
                body_carries_index: true,
                foot_index: false,
            },
            CbrFooter | CbrFooterIsolated | VbrSparseFooter | VbrFullFooter => Shape {
                head_index: false,
                pre_body_index: false,
                body_carries_index: false,
                foot_index: true,
            },
        }
    }
}

fn body_state(shape: &Shape) -> BodyState {
    if shape.body_carries_index {
        BodyState::BodyWithIndex
    } else {
        BodyState::BodyNoIndex
    }
}

/// Advance the state machine by one step. `end_of_essence` forces the
/// earliest compatible transition to `Done`, passing through `FootIndex`
/// first if the policy requires a footer index.
pub fn next_state(policy: IndexPolicy, current: BodyState, end_of_essence: bool) -> BodyState {
    let shape = policy.shape();

    if end_of_essence {
        return match current {
            BodyState::Done => BodyState::Done,
            BodyState::FootIndex => BodyState::Done,
            _ if shape.foot_index => BodyState::FootIndex,
            _ => BodyState::Done,
        };
    }

    match current {
        BodyState::Start => {
            if shape.head_index {
                BodyState::HeadIndex
            } else if shape.pre_body_index {
                BodyState::PreBodyIndex
            } else {
                body_state(&shape)
            }
        }
        BodyState::HeadIndex => {
            if shape.pre_body_index {
                BodyState::PreBodyIndex
            } else {
                body_state(&shape)
            }
        }
        BodyState::PreBodyIndex | BodyState::BodyWithIndex | BodyState::BodyNoIndex | BodyState::PostBodyIndex => {
            body_state(&shape)
        }
        BodyState::FootIndex => BodyState::Done,
        BodyState::Done => BodyState::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbr_in_header_skips_pre_body_isolated_state() {
        let mut state = BodyState::Start;
        state = next_state(IndexPolicy::CbrInHeader, state, false);
        assert_eq!(state, BodyState::HeadIndex);
        state = next_state(IndexPolicy::CbrInHeader, state, false);
        assert_eq!(state, BodyState::BodyNoIndex);
    }

    #[test]
    fn vbr_sprinkled_stays_in_body_with_index_loop() {
        let mut state = BodyState::Start;
        for _ in 0..5 {
            state = next_state(IndexPolicy::VbrSprinkled, state, false);
            assert_eq!(state, BodyState::BodyWithIndex);
        }
    }

    #[test]
    fn end_of_essence_routes_through_required_footer_index() {
        let state = next_state(IndexPolicy::VbrFullFooter, BodyState::BodyNoIndex, true);
        assert_eq!(state, BodyState::FootIndex);
        let state = next_state(IndexPolicy::VbrFullFooter, state, true);
        assert_eq!(state, BodyState::Done);
    }

    #[test]
    fn end_of_essence_goes_straight_to_done_without_footer_requirement() {
        let state = next_state(IndexPolicy::CbrInHeader, BodyState::BodyNoIndex, true);
        assert_eq!(state, BodyState::Done);
    }

    #[test]
    fn done_is_idempotent() {
        let state = next_state(IndexPolicy::CbrInHeader, BodyState::Done, false);
        assert_eq!(state, BodyState::Done);
        let state = next_state(IndexPolicy::CbrInHeader, BodyState::Done, true);
        assert_eq!(state, BodyState::Done);
    }

    #[test]
    fn cbr_pre_body_visits_pre_body_index_once() {
        let mut state = BodyState::Start;
        state = next_state(IndexPolicy::CbrPreBody, state, false);
        assert_eq!(state, BodyState::PreBodyIndex);
        state = next_state(IndexPolicy::CbrPreBody, state, false);
        assert_eq!(state, BodyState::BodyNoIndex);
    }
}
