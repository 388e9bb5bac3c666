//! Structural verification of a finished CFG: every branch target exists,
//! every block is reachable from the entry, and every branching block
//! dominates both of its successors (loop headers dominate their body and
//! exit). Run after translation and after every optimization pass; a failure
//! here is a compiler defect surfaced as [`TranslateError::MalformedCfg`].

use petgraph::algo::dominators;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::ir::{Function, Module, Term};
use crate::translate::TranslateError;

pub fn verify(module: &Module) -> Result<(), TranslateError> {
    verify_function(&module.function)
}

pub fn verify_function(function: &Function) -> Result<(), TranslateError> {
    if function.is_empty() {
        return Err(malformed("function has no blocks".to_string()));
    }

    // Branch targets must exist before we can treat blocks as graph nodes
    for id in function.ids() {
        for target in function[id].term.successors() {
            if target.index() >= function.len() {
                return Err(malformed(format!(
                    "{} branches to nonexistent block {}",
                    id, target
                )));
            }
        }
    }

    let (graph, nodes) = block_graph(function);
    let entry = nodes[function.entry().index()];

    let mut reached = vec![false; function.len()];
    let mut dfs = Dfs::new(&graph, entry);
    while let Some(node) = dfs.next(&graph) {
        reached[node.index()] = true;
    }
    if let Some(index) = reached.iter().position(|seen| !seen) {
        return Err(malformed(format!(
            "bb{} is unreachable from the entry block",
            index
        )));
    }

    let dom = dominators::simple_fast(&graph, entry);
    for id in function.ids() {
        if let Term::BranchIfZero { zero, nonzero } = function[id].term {
            for target in [zero, nonzero] {
                let dominated = dom
                    .dominators(nodes[target.index()])
                    .map(|mut doms| doms.any(|d| d == nodes[id.index()]))
                    .unwrap_or(false);
                if !dominated {
                    return Err(malformed(format!(
                        "branching block {} does not dominate its successor {}",
                        id, target
                    )));
                }
            }
        }
    }

    Ok(())
}

fn malformed(detail: String) -> TranslateError {
    TranslateError::MalformedCfg { detail }
}

fn block_graph(function: &Function) -> (DiGraph<(), ()>, Vec<NodeIndex>) {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = function.ids().map(|_| graph.add_node(())).collect();
    for id in function.ids() {
        for target in function[id].term.successors() {
            graph.add_edge(nodes[id.index()], nodes[target.index()], ());
        }
    }
    (graph, nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Block, BlockId, Inst};
    use crate::translate::translate;

    fn block(insts: Vec<Inst>, term: Term) -> Block {
        Block { insts, term }
    }

    #[test]
    fn test_translator_output_verifies() {
        for source in ["", "+.", "[-]", "[[]]", "+[>+<-]>.", "[.[.].][,]"] {
            let module = translate(source).unwrap();
            assert!(verify(&module).is_ok(), "{:?} should verify", source);
        }
    }

    #[test]
    fn test_detects_out_of_range_target() {
        let function = Function {
            blocks: vec![block(vec![], Term::Jump(BlockId(9)))],
        };
        let err = verify_function(&function).unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_detects_unreachable_block() {
        let function = Function {
            blocks: vec![
                block(vec![], Term::Return),
                block(vec![Inst::Output], Term::Return),
            ],
        };
        let err = verify_function(&function).unwrap_err();
        assert!(err.to_string().contains("bb1 is unreachable"));
    }

    #[test]
    fn test_detects_branch_that_does_not_dominate_successor() {
        // bb0 → {bb1, bb2}; bb1 → bb3; bb2 → {bb3, bb1}. bb3 can be reached
        // around bb2, so bb2 dominates neither successor.
        let function = Function {
            blocks: vec![
                block(
                    vec![],
                    Term::BranchIfZero {
                        zero: BlockId(1),
                        nonzero: BlockId(2),
                    },
                ),
                block(vec![], Term::Jump(BlockId(3))),
                block(
                    vec![],
                    Term::BranchIfZero {
                        zero: BlockId(3),
                        nonzero: BlockId(1),
                    },
                ),
                block(vec![], Term::Return),
            ],
        };
        let err = verify_function(&function).unwrap_err();
        assert!(err.to_string().contains("bb2 does not dominate"));
    }

    #[test]
    fn test_rejects_empty_function() {
        let function = Function { blocks: vec![] };
        assert!(verify_function(&function).is_err());
    }

    #[test]
    fn test_self_loop_branch_is_dominated() {
        // A block trivially dominates itself
        let function = Function {
            blocks: vec![
                block(vec![], Term::Jump(BlockId(1))),
                block(
                    vec![Inst::AddCell(-1)],
                    Term::BranchIfZero {
                        zero: BlockId(2),
                        nonzero: BlockId(1),
                    },
                ),
                block(vec![], Term::Return),
            ],
        };
        assert!(verify_function(&function).is_ok());
    }
}
