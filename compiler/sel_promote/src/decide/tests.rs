use pretty_assertions::assert_eq;
use smallvec::smallvec;

use sel_ir::{ConstValue, Operand, Program};

use crate::callgraph::CallGraph;
use crate::classify::classify_sites;
use crate::config::{CostModel, InstrCountCost, PromoteConfig};
use crate::domain::DomainTable;
use crate::report::IneligibleReason;
use crate::test_helpers::{
    bool_param, call_body, cbool, cint, fid, func, int_param, local, program, ret_body,
};

use super::*;

fn run(prog: &Program, config: &PromoteConfig) -> FxHashMap<FuncId, Decision> {
    run_with_cost(prog, config, &InstrCountCost)
}

fn run_with_cost(
    prog: &Program,
    config: &PromoteConfig,
    cost: &dyn CostModel,
) -> FxHashMap<FuncId, Decision> {
    let graph = CallGraph::build(prog).unwrap();
    let classified = classify_sites(prog, &graph).unwrap();
    let domains = DomainTable::build(prog, &graph, &classified);
    decide(prog, &graph, &classified, &domains, config, cost)
}

fn promoted(decisions: &FxHashMap<FuncId, Decision>, id: FuncId) -> &PromotionRecord {
    match decisions.get(&id) {
        Some(Decision::Promoted(record)) => record,
        other => panic!("expected promotion for {}, got {other:?}", id.raw()),
    }
}

#[test]
fn single_observed_value_promotes_one_variant() {
    let prog = program(vec![
        func(fid(0), "g", vec![bool_param("b")], ret_body()),
        func(fid(1), "main", vec![], call_body(vec![(fid(0), vec![cbool(false)])])),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    let record = promoted(&decisions, fid(0));
    assert_eq!(record.promoted, vec![0]);
    assert_eq!(record.variants, vec![smallvec![ConstValue::Bool(false)] as VariantTuple]);
}

#[test]
fn full_domain_is_declined_by_default() {
    let prog = program(vec![
        func(fid(0), "f", vec![bool_param("b")], ret_body()),
        func(
            fid(1),
            "main",
            vec![],
            call_body(vec![(fid(0), vec![cbool(true)]), (fid(0), vec![cbool(false)])]),
        ),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(
        decisions.get(&fid(0)),
        Some(&Decision::NotEligible(IneligibleReason::FullDomainObserved)),
    );
}

#[test]
fn full_domain_promotes_with_the_toggle() {
    let prog = program(vec![
        func(fid(0), "f", vec![bool_param("b")], ret_body()),
        func(
            fid(1),
            "main",
            vec![],
            call_body(vec![(fid(0), vec![cbool(true)]), (fid(0), vec![cbool(false)])]),
        ),
    ]);
    let config = PromoteConfig { promote_fully_observed: true, ..PromoteConfig::default() };
    let decisions = run(&prog, &config);

    let record = promoted(&decisions, fid(0));
    assert_eq!(
        record.variants,
        vec![
            smallvec![ConstValue::Bool(false)] as VariantTuple,
            smallvec![ConstValue::Bool(true)] as VariantTuple,
        ],
    );
}

#[test]
fn variants_are_co_occurring_tuples_not_a_cartesian_product() {
    // Called with (true, 1) and (false, 2): (true, 2) was never passed
    // and must not be generated. The boolean covers its whole domain, so
    // the toggle keeps it in the promotion set.
    let prog = program(vec![
        func(fid(0), "p", vec![bool_param("b"), int_param("n", 0, 9)], ret_body()),
        func(
            fid(1),
            "main",
            vec![],
            call_body(vec![
                (fid(0), vec![cbool(true), cint(1)]),
                (fid(0), vec![cbool(false), cint(2)]),
            ]),
        ),
    ]);
    let config = PromoteConfig { promote_fully_observed: true, ..PromoteConfig::default() };
    let decisions = run(&prog, &config);

    let record = promoted(&decisions, fid(0));
    assert_eq!(record.promoted, vec![0, 1]);
    assert_eq!(
        record.variants,
        vec![
            smallvec![ConstValue::Bool(false), ConstValue::Int(2)] as VariantTuple,
            smallvec![ConstValue::Bool(true), ConstValue::Int(1)] as VariantTuple,
        ],
    );
}

#[test]
fn runtime_poisoned_parameter_rolls_up() {
    let prog = program(vec![
        func(fid(0), "m", vec![bool_param("b")], ret_body()),
        func(
            fid(1),
            "main",
            vec![],
            call_body(vec![(fid(0), vec![local(0)]), (fid(0), vec![cbool(false)])]),
        ),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(
        decisions.get(&fid(0)),
        Some(&Decision::NotEligible(IneligibleReason::RuntimeArgumentPresent)),
    );
}

#[test]
fn unbounded_parameter_rolls_up() {
    let prog = program(vec![
        func(
            fid(0),
            "h",
            vec![crate::test_helpers::unbounded_param("n")],
            ret_body(),
        ),
        func(fid(1), "main", vec![], call_body(vec![(fid(0), vec![cint(4)])])),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(
        decisions.get(&fid(0)),
        Some(&Decision::NotEligible(IneligibleReason::UnboundedDomain)),
    );
}

#[test]
fn parameterless_functions_have_nothing_to_promote() {
    let prog = program(vec![
        func(fid(0), "f", vec![], ret_body()),
        func(fid(1), "main", vec![], call_body(vec![(fid(0), vec![])])),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(
        decisions.get(&fid(0)),
        Some(&Decision::NotEligible(IneligibleReason::NoPromotableParams)),
    );
}

// ── Bloat heuristic ─────────────────────────────────────────────

#[test]
fn too_many_variants_rejects_the_whole_function() {
    let sites: Vec<_> = (0..20).map(|i| (fid(0), vec![cint(i)])).collect();
    let prog = program(vec![
        func(fid(0), "h", vec![int_param("n", 0, 63)], ret_body()),
        func(fid(1), "main", vec![], call_body(sites)),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(decisions.get(&fid(0)), Some(&Decision::RejectedByBloat { variant_count: 20 }));
}

#[test]
fn growth_budget_rejects_even_small_variant_counts() {
    struct HugeBody;
    impl CostModel for HugeBody {
        fn body_size(&self, _: &sel_ir::Function) -> usize {
            1 << 20
        }
    }

    let prog = program(vec![
        func(fid(0), "g", vec![bool_param("b")], ret_body()),
        func(fid(1), "main", vec![], call_body(vec![(fid(0), vec![cbool(true)])])),
    ]);
    let decisions = run_with_cost(&prog, &PromoteConfig::default(), &HugeBody);

    assert_eq!(decisions.get(&fid(0)), Some(&Decision::RejectedByBloat { variant_count: 1 }));
}

// ── Recursion ───────────────────────────────────────────────────

#[test]
fn self_recursion_projects_through_its_own_variants() {
    let prog = program(vec![
        func(
            fid(0),
            "f",
            vec![bool_param("b")],
            call_body(vec![(fid(0), vec![Operand::Param(0)])]),
        ),
        func(fid(1), "main", vec![], call_body(vec![(fid(0), vec![cbool(true)])])),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    let record = promoted(&decisions, fid(0));
    assert_eq!(record.variants, vec![smallvec![ConstValue::Bool(true)] as VariantTuple]);
}

#[test]
fn rejecting_one_member_poisons_its_dependents() {
    // h would need 20 variants and is rejected; g's parameter is fed by
    // h's parameter around the cycle, so g cannot be promoted either.
    let h_sites: Vec<_> = (0..20).map(|i| (fid(0), vec![cint(i)])).collect();
    let prog = program(vec![
        func(
            fid(0),
            "h",
            vec![int_param("n", 0, 63)],
            call_body(vec![(fid(1), vec![Operand::Param(0)])]),
        ),
        func(
            fid(1),
            "g",
            vec![int_param("n", 0, 63)],
            call_body(vec![(fid(0), vec![Operand::Param(0)])]),
        ),
        func(fid(2), "main", vec![], call_body(h_sites)),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(decisions.get(&fid(0)), Some(&Decision::RejectedByBloat { variant_count: 20 }));
    assert_eq!(
        decisions.get(&fid(1)),
        Some(&Decision::NotEligible(IneligibleReason::RuntimeArgumentPresent)),
    );
}

#[test]
fn rejection_spares_members_with_their_own_small_surface() {
    // h is bloated; g is on the same cycle but fed only by literals from
    // h's body, so g still promotes after h's rejection.
    let h_sites: Vec<_> = (0..20).map(|i| (fid(0), vec![cint(i)])).collect();
    let prog = program(vec![
        func(
            fid(0),
            "h",
            vec![int_param("n", 0, 63)],
            call_body(vec![(fid(1), vec![cint(1)]), (fid(1), vec![cint(2)])]),
        ),
        func(
            fid(1),
            "g",
            vec![int_param("n", 0, 63)],
            call_body(vec![(fid(0), vec![Operand::Param(0)])]),
        ),
        func(fid(2), "main", vec![], call_body(h_sites)),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(decisions.get(&fid(0)), Some(&Decision::RejectedByBloat { variant_count: 20 }));
    let record = promoted(&decisions, fid(1));
    assert_eq!(
        record.variants,
        vec![
            smallvec![ConstValue::Int(1)] as VariantTuple,
            smallvec![ConstValue::Int(2)] as VariantTuple,
        ],
    );
}

#[test]
fn dead_recursive_cluster_is_left_alone() {
    // f and g only call each other; no live call site seeds a variant.
    let prog = program(vec![
        func(
            fid(0),
            "f",
            vec![bool_param("b")],
            call_body(vec![(fid(1), vec![Operand::Param(0)])]),
        ),
        func(
            fid(1),
            "g",
            vec![bool_param("b")],
            call_body(vec![(fid(0), vec![Operand::Param(0)])]),
        ),
    ]);
    let decisions = run(&prog, &PromoteConfig::default());

    assert_eq!(
        decisions.get(&fid(0)),
        Some(&Decision::NotEligible(IneligibleReason::NoLiveCallSites)),
    );
    assert_eq!(
        decisions.get(&fid(1)),
        Some(&Decision::NotEligible(IneligibleReason::NoLiveCallSites)),
    );
}
