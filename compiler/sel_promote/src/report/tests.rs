use pretty_assertions::assert_eq;
use smallvec::smallvec;

use sel_ir::{ConstValue, FuncId};

use super::*;

fn entry(name: &str, decision: PassDecision) -> FuncReport {
    FuncReport { func: FuncId::new(0), name: name.to_string(), decision }
}

#[test]
fn display_names_every_decision() {
    let report = PassReport {
        generations: vec![GenerationReport {
            entries: vec![
                entry(
                    "f",
                    PassDecision::Promoted {
                        params: vec![PromotedParam { index: 0, unobserved: 1 }],
                        variants: vec![VariantInfo {
                            name: "f_false".to_string(),
                            values: smallvec![ConstValue::Bool(false)],
                        }],
                    },
                ),
                entry("k", PassDecision::NotEligible(IneligibleReason::Exported)),
                entry("h", PassDecision::RejectedByBloat { variant_count: 20 }),
            ],
        }],
    };

    let text = report.to_string();
    assert_eq!(
        text,
        "generation 1:\n\
         \x20\x20f: promoted on params [0] -> f_false(false) (1 domain values unobserved)\n\
         \x20\x20k: not eligible (exported symbol)\n\
         \x20\x20h: rejected by bloat heuristic (20 variants)\n",
    );
}

#[test]
fn counts_promotions_across_generations() {
    let promoted = PassDecision::Promoted { params: vec![], variants: vec![] };
    let report = PassReport {
        generations: vec![
            GenerationReport {
                entries: vec![
                    entry("a", promoted.clone()),
                    entry("b", PassDecision::NotEligible(IneligibleReason::NoCallSites)),
                ],
            },
            GenerationReport { entries: vec![entry("c", promoted)] },
        ],
    };

    assert_eq!(report.generations[0].promoted_count(), 1);
    assert_eq!(report.total_promoted(), 2);
}
