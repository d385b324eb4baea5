use crate::advisors::insight::ActionPlan;
use crate::scoring::SupportDesignation;

/// Generic triage plan keyed only on the support designation.
pub(crate) fn master_action_plan(designation: SupportDesignation) -> ActionPlan {
    let (immediate, short_term, long_term): (&[&str], &[&str], &[&str]) = match designation {
        SupportDesignation::YUsaSupport => (
            &[
                "Schedule a consultation with the Y-USA association support team",
                "Share this assessment with the board executive committee",
                "Identify the two lowest-scoring metrics as recovery priorities",
            ],
            &[
                "Adopt a 90-day improvement plan with named owners",
                "Report progress on priority metrics at every board meeting",
            ],
            &[
                "Reassess with the full survey within twelve months",
                "Build internal capacity to sustain improvements without network support",
            ],
        ),
        SupportDesignation::IndependentImprovement => (
            &[
                "Share this assessment with senior staff and the board",
                "Select one improvement goal per advisor focus area",
            ],
            &[
                "Track selected goals in monthly leadership reviews",
                "Connect with peer associations on the strongest practices",
            ],
            &[
                "Reassess annually to confirm sustained progress",
                "Document successful practices for the wider network",
            ],
        ),
    };

    ActionPlan {
        immediate: immediate.iter().map(|item| item.to_string()).collect(),
        short_term: short_term.iter().map(|item| item.to_string()).collect(),
        long_term: long_term.iter().map(|item| item.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_designations_produce_complete_plans() {
        let supported = master_action_plan(SupportDesignation::YUsaSupport);
        let independent = master_action_plan(SupportDesignation::IndependentImprovement);

        assert!(supported.is_complete());
        assert!(independent.is_complete());
        assert_ne!(supported, independent);
        assert!(supported.immediate[0].contains("Y-USA"));
    }
}
