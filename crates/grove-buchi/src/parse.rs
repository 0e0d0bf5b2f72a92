//! Line-oriented text format for automata.
//!
//! ```text
//! # never claim for "G !error"
//! init T0
//! accept accept_all
//! T0 -> T0 : true
//! T0 -> accept_all : error
//! accept_all -> accept_all : true
//! ```
//!
//! Locations are declared by mentioning them. A guard is `true` or a
//! conjunction of literals `p` / `!p` joined by `&&`.

use crate::automaton::{AutomatonBuilder, BuchiAutomaton, Guard};
use crate::error::{AutomatonError, AutomatonResult};
use std::collections::BTreeSet;
use tracing::debug;

pub fn parse_automaton(source: &str) -> AutomatonResult<BuchiAutomaton> {
    let mut order: Vec<String> = Vec::new();
    let mut accepting: BTreeSet<String> = BTreeSet::new();
    let mut initial: Option<String> = None;
    let mut transitions: Vec<(String, Guard, String)> = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("init ") {
            let name = identifier(rest.trim(), line_no)?;
            if initial.is_some() {
                return Err(syntax(line_no, "initial location declared twice"));
            }
            declare(name, &mut order);
            initial = Some(name.to_string());
        } else if let Some(rest) = line.strip_prefix("accept ") {
            let name = identifier(rest.trim(), line_no)?;
            declare(name, &mut order);
            accepting.insert(name.to_string());
        } else if let Some((from, rest)) = line.split_once("->") {
            let (to, guard) = match rest.split_once(':') {
                Some((to, guard)) => (to, guard),
                None => return Err(syntax(line_no, "expected ':' before the guard")),
            };
            let from = identifier(from.trim(), line_no)?;
            let to = identifier(to.trim(), line_no)?;
            let guard = parse_guard(guard.trim(), line_no)?;
            declare(from, &mut order);
            declare(to, &mut order);
            transitions.push((from.to_string(), guard, to.to_string()));
        } else {
            return Err(syntax(line_no, &format!("unrecognised line '{}'", line)));
        }
    }

    let mut builder = AutomatonBuilder::default();
    for name in &order {
        builder.location(name, accepting.contains(name));
    }
    if let Some(name) = &initial {
        builder.initial(name);
    }
    for (from, guard, to) in transitions {
        builder.transition(&from, guard, &to);
    }
    let automaton = builder.build()?;
    debug!(
        locations = automaton.len(),
        propositions = automaton.propositions().len(),
        "parsed automaton"
    );
    Ok(automaton)
}

impl std::str::FromStr for BuchiAutomaton {
    type Err = AutomatonError;

    fn from_str(s: &str) -> AutomatonResult<Self> {
        parse_automaton(s)
    }
}

fn declare(name: &str, order: &mut Vec<String>) {
    if !order.iter().any(|n| n == name) {
        order.push(name.to_string());
    }
}

fn parse_guard(text: &str, line: usize) -> AutomatonResult<Guard> {
    if text == "true" {
        return Ok(Guard::always());
    }
    let mut guard = Guard::always();
    for literal in text.split("&&") {
        let literal = literal.trim();
        guard = match literal.strip_prefix('!') {
            Some(p) => guard.forbid(identifier(p.trim(), line)?),
            None => guard.require(identifier(literal, line)?),
        };
    }
    Ok(guard)
}

fn identifier(text: &str, line: usize) -> AutomatonResult<&str> {
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(text)
    } else {
        Err(syntax(line, &format!("invalid name '{}'", text)))
    }
}

fn syntax(line: usize, message: &str) -> AutomatonError {
    AutomatonError::Syntax {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_parse_never_claim() {
        let aut = parse_automaton(
            "# G !error\n\
             init T0\n\
             accept acc\n\
             T0 -> T0 : true\n\
             T0 -> acc : error && !reset\n\
             acc -> acc : true\n",
        )
        .unwrap();
        assert_eq!(aut.len(), 2);
        let t0 = aut.initial_location();
        assert_eq!(aut.location(t0).name, "T0");
        assert!(!aut.is_accepting(t0));
        let acc = aut.find("acc").unwrap();
        assert!(aut.is_accepting(acc));
        let to_acc = &aut.out_transitions(t0)[1];
        assert_eq!(to_acc.target, acc);
        assert!(to_acc.guard.positive().contains(&Arc::<str>::from("error")));
        assert!(to_acc.guard.negative().contains(&Arc::<str>::from("reset")));
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let text = "init a\naccept b\na -> b : p && !q\nb -> a : true\n";
        let aut = parse_automaton(text).unwrap();
        let reparsed: BuchiAutomaton = aut.to_string().parse().unwrap();
        assert_eq!(reparsed, aut);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        assert_eq!(
            parse_automaton("init a\na -> a true\n"),
            Err(AutomatonError::Syntax {
                line: 2,
                message: "expected ':' before the guard".to_string()
            })
        );
        assert!(matches!(
            parse_automaton("init a\nfoo bar\n"),
            Err(AutomatonError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse_automaton("init a\na -> a : p && \n"),
            Err(AutomatonError::Syntax { line: 2, .. })
        ));
        assert_eq!(
            parse_automaton("accept a\na -> a : true\n"),
            Err(AutomatonError::MissingInitial)
        );
    }
}
