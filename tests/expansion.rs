// tests/expansion.rs
use gridbot::{
    Command, ExpandLimits, ExpansionWarning, FunctionDefinition, MAX_FUNCTION_CALLS, Routine,
    expand, expand_with,
};

use Command::{Left, Move, Right};

fn call(r: Routine) -> Command {
    Command::Call(r)
}

fn routines(defs: &[(Routine, &[Command])]) -> Vec<FunctionDefinition> {
    defs.iter()
        .map(|(name, body)| FunctionDefinition::new(*name, body.to_vec()))
        .collect()
}

#[test]
fn test_plain_queue_passes_through() {
    let queue = vec![Move, Left, Command::Paint(gridbot::Color::Red), Right, Move];
    let result = expand(&queue, &FunctionDefinition::empty_set());

    assert_eq!(result.commands, queue);
    assert_eq!(result.warning, None);
}

#[test]
fn test_self_recursion_stops_at_call_limit() {
    // F0 = MOVE F0, called once from the main queue.
    let functions = routines(&[(Routine::F0, &[Move, call(Routine::F0)])]);
    let result = expand(&[call(Routine::F0)], &functions);

    assert_eq!(result.commands, vec![Move; MAX_FUNCTION_CALLS]);
    assert_eq!(
        result.warning,
        Some(ExpansionWarning::CallLimit {
            routine: Routine::F0,
            limit: MAX_FUNCTION_CALLS
        })
    );
}

#[test]
fn test_undefined_and_empty_routines_are_dropped() {
    // F1 is empty, F2 has no definition at all.
    let functions = routines(&[(Routine::F0, &[Move]), (Routine::F1, &[])]);
    let queue = [call(Routine::F1), call(Routine::F0), call(Routine::F2), Left];
    let result = expand(&queue, &functions);

    assert_eq!(result.commands, vec![Move, Left]);
    assert_eq!(result.warning, None);
}

#[test]
fn test_repeated_reference_expands_each_time() {
    let functions = routines(&[
        (Routine::F0, &[call(Routine::F1), Right, call(Routine::F1)]),
        (Routine::F1, &[Move, Move]),
    ]);
    let result = expand(&[call(Routine::F0)], &functions);

    assert_eq!(result.commands, vec![Move, Move, Right, Move, Move]);
    assert_eq!(result.warning, None);
}

#[test]
fn test_call_counts_are_scoped_to_the_path() {
    // Twelve sibling calls never nest, so none of them hits the per-path limit.
    let functions = routines(&[(Routine::F1, &[Move])]);
    let queue = vec![call(Routine::F1); 12];
    let result = expand(&queue, &functions);

    assert_eq!(result.commands, vec![Move; 12]);
    assert_eq!(result.warning, None);
}

#[test]
fn test_mutual_recursion_terminates() {
    // F0 = MOVE F1, F1 = LEFT F0
    let functions = routines(&[
        (Routine::F0, &[Move, call(Routine::F1)]),
        (Routine::F1, &[Left, call(Routine::F0)]),
    ]);
    let result = expand(&[call(Routine::F0)], &functions);

    let expected: Vec<Command> = std::iter::repeat([Move, Left])
        .take(MAX_FUNCTION_CALLS)
        .flatten()
        .collect();
    assert_eq!(result.commands, expected);
    assert_eq!(
        result.warning,
        Some(ExpansionWarning::CallLimit {
            routine: Routine::F0,
            limit: MAX_FUNCTION_CALLS
        })
    );
}

#[test]
fn test_depth_limit_cuts_expansion_short() {
    let limits = ExpandLimits {
        max_recursion_depth: 3,
        max_function_calls: 100,
        ..ExpandLimits::default()
    };
    let functions = routines(&[(Routine::F0, &[Move, call(Routine::F0)])]);
    let result = expand_with(&[call(Routine::F0), Right], &functions, limits);

    // Bodies at depth 1, 2 and 3 run; depth 4 contributes nothing. The caller
    // keeps going after the truncated call.
    assert_eq!(result.commands, vec![Move, Move, Move, Right]);
    assert_eq!(result.warning, Some(ExpansionWarning::DepthLimit { limit: 3 }));
}

#[test]
fn test_last_warning_in_traversal_order_wins() {
    let limits = ExpandLimits {
        max_recursion_depth: 50,
        max_function_calls: 1,
        ..ExpandLimits::default()
    };
    let functions = routines(&[
        (Routine::F0, &[Move, call(Routine::F0)]),
        (Routine::F1, &[Right, call(Routine::F1)]),
    ]);
    let result = expand_with(&[call(Routine::F0), call(Routine::F1)], &functions, limits);

    assert_eq!(result.commands, vec![Move, Right]);
    assert_eq!(
        result.warning,
        Some(ExpansionWarning::CallLimit {
            routine: Routine::F1,
            limit: 1
        })
    );
}

#[test]
fn test_cross_recursion_leaves_no_calls() {
    let limits = ExpandLimits {
        max_recursion_depth: 50,
        max_function_calls: 2,
        ..ExpandLimits::default()
    };
    let functions = routines(&[
        (Routine::F0, &[call(Routine::F1), call(Routine::F2), Move]),
        (Routine::F1, &[call(Routine::F2), call(Routine::F0), Left]),
        (Routine::F2, &[call(Routine::F0), call(Routine::F1), Right]),
    ]);
    let result = expand_with(&[call(Routine::F0)], &functions, limits);

    assert!(!result.is_empty());
    assert!(result.commands.iter().all(|c| !c.is_call()));
    assert!(matches!(result.warning, Some(ExpansionWarning::CallLimit { limit: 2, .. })));
}

#[test]
fn test_wide_recursion_is_abandoned_past_the_output_budget() {
    let functions = routines(&[
        (Routine::F0, &[call(Routine::F1), call(Routine::F1)]),
        (Routine::F1, &[call(Routine::F2), call(Routine::F2)]),
        (Routine::F2, &[Move, call(Routine::F0), call(Routine::F0)]),
    ]);
    let result = expand(&[call(Routine::F0), Left], &functions);

    assert!(result.truncated);
    // Routine output stops one past the budget; the trailing plain command is kept.
    assert_eq!(result.len(), ExpandLimits::default().max_commands + 2);
    assert_eq!(result.commands.last(), Some(&Left));
}

#[test]
fn test_long_plain_queue_is_never_truncated() {
    let queue = vec![Move; 2500];
    let result = expand(&queue, &FunctionDefinition::empty_set());

    assert!(!result.truncated);
    assert_eq!(result.commands, queue);
}

#[test]
fn test_commands_use_tokens_in_json() {
    let queue: Vec<Command> =
        serde_json::from_str(r#"["MOVE", "F2", "PAINT_GREEN", "IF_PINK"]"#).unwrap();
    assert_eq!(
        queue,
        vec![
            Move,
            call(Routine::F2),
            Command::Paint(gridbot::Color::Green),
            Command::If(gridbot::Color::Pink),
        ]
    );
    assert!(serde_json::from_str::<Vec<Command>>(r#"["FLY"]"#).is_err());
}
