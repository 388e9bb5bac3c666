//! The optimization pipeline: four passes in a fixed order, each total and
//! behavior-preserving, each leaving the CFG verifier-clean. Running the
//! whole pipeline a second time produces byte-identical canonical output,
//! which the content hash of the dump certifies.
//!
//! 1. [`coalesce_runs`] merges adjacent cell/pointer arithmetic per block.
//! 2. [`eliminate_dead_loops`] removes loops whose every entry edge
//!    provably carries a zero cell, by structure alone.
//! 3. [`fold_constant_cells`] tracks the current cell through the graph and
//!    resolves provably-constant branches to jumps.
//! 4. [`merge_trivial_blocks`] splices single-predecessor jump targets into
//!    their predecessor.

use crate::ir::verify::verify_function;
use crate::ir::{BlockId, Function, Inst, Module, Term, TAPE_CELLS};

/// Run the full pipeline over a module. Each pass is re-verified; a failure
/// is a defect in the pass, not in user input, and panics.
pub fn optimize(module: &mut Module) {
    let function = &mut module.function;
    run_pass(function, "coalesce_runs", coalesce_runs);
    run_pass(function, "eliminate_dead_loops", eliminate_dead_loops);
    run_pass(function, "fold_constant_cells", fold_constant_cells);
    run_pass(function, "merge_trivial_blocks", merge_trivial_blocks);
}

fn run_pass(function: &mut Function, name: &str, pass: fn(&mut Function)) {
    pass(function);
    if let Err(err) = verify_function(function) {
        panic!("pass {} left the CFG malformed: {}", name, err);
    }
}

// ─────────────────────────── 1. Run coalescing ───────────────────────────

/// Merge adjacent `add_cell` runs (wrapping 8-bit) and adjacent `move_ptr`
/// runs (reduced modulo the tape length, sign preserved). A merged delta of
/// zero drops the instruction, which can cascade into further merges.
pub fn coalesce_runs(function: &mut Function) {
    for block in &mut function.blocks {
        coalesce_insts(&mut block.insts);
    }
}

fn coalesce_insts(insts: &mut Vec<Inst>) {
    let mut out: Vec<Inst> = Vec::with_capacity(insts.len());
    for inst in insts.drain(..) {
        let merged = match (out.last(), inst) {
            (Some(&Inst::AddCell(a)), Inst::AddCell(b)) => Some(Inst::AddCell(a.wrapping_add(b))),
            (Some(&Inst::MovePointer(a)), Inst::MovePointer(b)) => {
                Some(Inst::MovePointer(reduce_move(a as i64 + b as i64)))
            }
            _ => None,
        };
        match merged {
            Some(inst) => {
                out.pop();
                if !matches!(inst, Inst::AddCell(0) | Inst::MovePointer(0)) {
                    out.push(inst);
                }
            }
            None => out.push(inst),
        }
    }
    *insts = out;
}

// Truncating remainder keeps the sign of the accumulated delta
fn reduce_move(total: i64) -> i32 {
    (total % TAPE_CELLS as i64) as i32
}

// ─────────────────────────── 2. Dead-loop elimination ───────────────────────────

/// Remove loops that can never iterate. A loop header is dead when every
/// entry edge (predecessor not dominated by the header) comes from a block
/// that provably holds a zero cell: the block reads as zero at its start
/// (it is the function entry, or every edge into it is the zero leg of a
/// branch), contains nothing that touches the cell or the pointer, and
/// jumps straight to the header. Rewrites are computed against one snapshot
/// of the graph, then applied together.
pub fn eliminate_dead_loops(function: &mut Function) {
    loop {
        let rewrites = dead_loop_rewrites(function);
        if rewrites.is_empty() {
            break;
        }
        for (pred, exit) in rewrites {
            function[pred].term = Term::Jump(exit);
        }
        strip_unreachable(function);
    }
}

fn dead_loop_rewrites(function: &Function) -> Vec<(BlockId, BlockId)> {
    let preds = predecessors(function);
    let dominated = dominance(function);

    let zero_at_start = |p: BlockId| -> bool {
        let all_zero_edges = preds[p.index()].iter().all(|&q| {
            matches!(
                function[q].term,
                Term::BranchIfZero { zero, nonzero } if zero == p && nonzero != p
            )
        });
        if p == function.entry() {
            // The tape is zero-initialized, so the first visit is zero; any
            // incoming edges must be zero legs too.
            all_zero_edges
        } else {
            !preds[p.index()].is_empty() && all_zero_edges
        }
    };

    let mut rewrites = Vec::new();
    for header in function.ids() {
        let Term::BranchIfZero { zero: exit, .. } = function[header].term else {
            continue;
        };
        let entry_preds: Vec<BlockId> = preds[header.index()]
            .iter()
            .copied()
            .filter(|&p| !dominated(header, p))
            .collect();
        if entry_preds.is_empty() {
            continue;
        }
        let all_provably_zero = entry_preds.iter().all(|&p| {
            function[p].term == Term::Jump(header)
                && function[p].insts.iter().all(|i| matches!(i, Inst::Output))
                && zero_at_start(p)
        });
        if all_provably_zero {
            for p in entry_preds {
                rewrites.push((p, exit));
            }
        }
    }
    rewrites
}

// ─────────────────────────── 3. Constant-cell folding ───────────────────────────

/// What is known about the cell under the pointer at some program point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellFact {
    Unknown,
    NonZero,
    Known(u8),
}

impl CellFact {
    fn meet(self, other: CellFact) -> CellFact {
        use CellFact::*;
        match (self, other) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Known(x), Known(y)) => {
                if x == y {
                    Known(x)
                } else if x != 0 && y != 0 {
                    NonZero
                } else {
                    Unknown
                }
            }
            (NonZero, Known(v)) | (Known(v), NonZero) => {
                if v != 0 {
                    NonZero
                } else {
                    Unknown
                }
            }
            (NonZero, NonZero) => NonZero,
        }
    }

    fn after(self, inst: Inst) -> CellFact {
        use CellFact::*;
        match inst {
            Inst::AddCell(delta) => match self {
                Known(v) => Known(v.wrapping_add(delta as u8)),
                // A nonzero cell can wrap onto anything, zero included
                _ => Unknown,
            },
            Inst::MovePointer(0) => self,
            Inst::MovePointer(_) => Unknown,
            Inst::Input => Unknown,
            Inst::Output => self,
        }
    }
}

/// Resolve branches whose condition is provably constant. Facts flow only
/// along feasible edges: a branch known to be zero never feeds its nonzero
/// side, so the body of a loop entered with a provably-zero cell stays
/// unvisited and is stripped once the branch becomes a jump. The entry
/// block starts at `Known(0)` because the tape is zero-initialized.
pub fn fold_constant_cells(function: &mut Function) {
    loop {
        let facts = cell_facts(function);
        let mut folded = false;
        for id in function.ids() {
            let Some(mut fact) = facts[id.index()] else {
                continue;
            };
            for &inst in &function[id].insts {
                fact = fact.after(inst);
            }
            if let Term::BranchIfZero { zero, nonzero } = function[id].term {
                let target = match fact {
                    CellFact::Known(0) => Some(zero),
                    CellFact::Known(_) | CellFact::NonZero => Some(nonzero),
                    CellFact::Unknown => None,
                };
                if let Some(target) = target {
                    function[id].term = Term::Jump(target);
                    folded = true;
                }
            }
        }
        if !folded {
            break;
        }
        strip_unreachable(function);
    }
}

// Entry fact per block, `None` for blocks no feasible path reaches.
fn cell_facts(function: &Function) -> Vec<Option<CellFact>> {
    let mut facts: Vec<Option<CellFact>> = vec![None; function.len()];
    let mut work: Vec<BlockId> = Vec::new();

    let update = |facts: &mut Vec<Option<CellFact>>,
                  work: &mut Vec<BlockId>,
                  target: BlockId,
                  incoming: CellFact| {
        let merged = match facts[target.index()] {
            None => incoming,
            Some(old) => old.meet(incoming),
        };
        if facts[target.index()] != Some(merged) {
            facts[target.index()] = Some(merged);
            work.push(target);
        }
    };

    update(&mut facts, &mut work, function.entry(), CellFact::Known(0));
    while let Some(id) = work.pop() {
        let Some(mut fact) = facts[id.index()] else {
            continue;
        };
        for &inst in &function[id].insts {
            fact = fact.after(inst);
        }
        match function[id].term {
            Term::BranchIfZero { zero, nonzero } => match fact {
                CellFact::Known(0) => {
                    update(&mut facts, &mut work, zero, CellFact::Known(0));
                }
                CellFact::Known(v) => {
                    update(&mut facts, &mut work, nonzero, CellFact::Known(v));
                }
                CellFact::NonZero => {
                    update(&mut facts, &mut work, nonzero, CellFact::NonZero);
                }
                CellFact::Unknown => {
                    update(&mut facts, &mut work, zero, CellFact::Known(0));
                    update(&mut facts, &mut work, nonzero, CellFact::NonZero);
                }
            },
            Term::Jump(target) => update(&mut facts, &mut work, target, fact),
            Term::Return => {}
        }
    }
    facts
}

// ─────────────────────────── 4. Trivial block merging ───────────────────────────

/// Splice every jump target with exactly one predecessor into that
/// predecessor, collapsing whole jump chains. Spliced bodies are
/// re-coalesced so the seam cannot leave adjacent mergeable runs behind.
/// The entry block counts as referenced and is never spliced away.
pub fn merge_trivial_blocks(function: &mut Function) {
    loop {
        let mut refs = vec![0usize; function.len()];
        refs[function.entry().index()] += 1;
        for id in function.ids() {
            for target in function[id].term.successors() {
                refs[target.index()] += 1;
            }
        }

        let mut changed = false;
        for id in function.ids() {
            if refs[id.index()] == 0 {
                continue; // already spliced into its predecessor
            }
            let mut spliced = false;
            loop {
                let Term::Jump(target) = function[id].term else {
                    break;
                };
                if target == id || refs[target.index()] != 1 {
                    break;
                }
                let insts = std::mem::take(&mut function[target].insts);
                let term = function[target].term;
                function[id].insts.extend(insts);
                function[id].term = term;
                refs[target.index()] = 0;
                spliced = true;
            }
            if spliced {
                coalesce_insts(&mut function[id].insts);
                changed = true;
            }
        }

        if !changed {
            break;
        }
        strip_unreachable(function);
    }
}

// ─────────────────────────── Shared graph helpers ───────────────────────────

fn predecessors(function: &Function) -> Vec<Vec<BlockId>> {
    let mut preds: Vec<Vec<BlockId>> = vec![Vec::new(); function.len()];
    for id in function.ids() {
        for target in function[id].term.successors() {
            preds[target.index()].push(id);
        }
    }
    preds
}

// `dominance(f)(a, b)` is true when `a` dominates `b`.
fn dominance(function: &Function) -> impl Fn(BlockId, BlockId) -> bool {
    use petgraph::algo::dominators;
    use petgraph::graph::{DiGraph, NodeIndex};

    let mut graph = DiGraph::<(), ()>::new();
    let nodes: Vec<NodeIndex> = function.ids().map(|_| graph.add_node(())).collect();
    for id in function.ids() {
        for target in function[id].term.successors() {
            graph.add_edge(nodes[id.index()], nodes[target.index()], ());
        }
    }
    let doms = dominators::simple_fast(&graph, nodes[function.entry().index()]);
    move |a: BlockId, b: BlockId| {
        doms.dominators(nodes[b.index()])
            .map(|mut chain| chain.any(|d| d == nodes[a.index()]))
            .unwrap_or(false)
    }
}

/// Drop blocks unreachable from the entry and renumber the survivors,
/// remapping every branch target. Creation order of survivors is kept, so
/// dumps stay stable.
fn strip_unreachable(function: &mut Function) {
    let mut seen = vec![false; function.len()];
    let mut work = vec![function.entry()];
    seen[function.entry().index()] = true;
    while let Some(id) = work.pop() {
        for target in function[id].term.successors() {
            if !seen[target.index()] {
                seen[target.index()] = true;
                work.push(target);
            }
        }
    }
    if seen.iter().all(|&reached| reached) {
        return;
    }

    let mut remap: Vec<Option<BlockId>> = vec![None; function.len()];
    let mut next = 0u32;
    for (index, &reached) in seen.iter().enumerate() {
        if reached {
            remap[index] = Some(BlockId(next));
            next += 1;
        }
    }
    let old = std::mem::take(&mut function.blocks);
    for (index, mut block) in old.into_iter().enumerate() {
        if remap[index].is_none() {
            continue;
        }
        block
            .term
            .map_targets(|t| remap[t.index()].expect("reachable block targets a stripped block"));
        function.blocks.push(block);
    }
}
