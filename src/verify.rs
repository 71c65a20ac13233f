use crate::ast::*;

/// Static findings that do not stop a program from running. Labels stay lazily resolved,
/// so a missing target only fails if the instruction actually executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyWarning {
    pub code: &'static str,
    pub message: String,
    pub hint: Option<String>,
    pub position: Option<Position>,
}

impl std::fmt::Display for VerifyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verify: {}", self.message)?;
        if let Some(pos) = &self.position {
            write!(f, " at {pos}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

fn closest_match<'a>(name: &str, candidates: impl Iterator<Item = &'a Label>) -> Option<Label> {
    let mut best: Option<(Label, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(name, candidate);
        if dist <= 2 && best.as_ref().is_none_or(|(_, d)| dist < *d) {
            best = Some((candidate.clone(), dist));
        }
    }
    best.map(|(s, _)| s)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate().take(m + 1) { row[0] = i; }
    for (j, val) in dp[0].iter_mut().enumerate().take(n + 1) { *val = j; }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}

fn unresolved_target(program: &Program, ins: &Instruction, label: &Label) -> VerifyWarning {
    let hint = closest_match(label, program.labels.keys())
        .map(|near| format!("did you mean label \"{near}\"?"));
    VerifyWarning {
        code: "FFL-W001",
        message: format!("{} target \"{label}\" is never marked", ins.mnemonic()),
        hint,
        position: ins.position().cloned(),
    }
}

/// Scan a parsed program for label targets that are never marked and for `return`s that
/// can never have a matching `call`.
pub fn verify(program: &Program) -> Vec<VerifyWarning> {
    let mut warnings = Vec::new();

    for ins in &program.instructions {
        if let Some(label) = ins.target() {
            if program.label(label).is_none() {
                warnings.push(unresolved_target(program, ins, label));
            }
        }
    }

    let has_call = program.instructions.iter().any(|i| matches!(i, Instruction::Call { .. }));
    if !has_call {
        for ins in &program.instructions {
            if let Instruction::Return { pos } = ins {
                warnings.push(VerifyWarning {
                    code: "FFL-W002",
                    message: "return without any call in the program".to_string(),
                    hint: Some("the call stack is empty here, so this always fails".to_string()),
                    position: Some(pos.clone()),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_source(code: &str) -> Vec<VerifyWarning> {
        let tokens = crate::lexer::lex(code, "v.fflt").expect("lex failed");
        let program = crate::parser::parse(tokens, "v.fflt").expect("parse failed");
        verify(&program)
    }

    #[test]
    fn clean_program() {
        // label F; call F; jump F; end
        assert!(verify_source("TFFFT TFLFT TFTFT TTT").is_empty());
    }

    #[test]
    fn unresolved_jump_target() {
        // label FL; jump FF
        let warnings = verify_source("TFFFLT TFTFFT");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "FFL-W001");
        assert!(warnings[0].message.contains("JUMP target \"FF\""));
        assert_eq!(warnings[0].hint.as_deref(), Some("did you mean label \"FL\"?"));
        assert_eq!(warnings[0].position.as_ref().map(|p| p.column), Some(8));
    }

    #[test]
    fn unresolved_conditional_targets_each_reported() {
        // jz L; jn L
        let warnings = verify_source("TLFLT TLLLT");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.hint.is_none()));
    }

    #[test]
    fn return_without_call() {
        let warnings = verify_source("TLT");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "FFL-W002");
        assert!(warnings[0].to_string().starts_with("verify: return without any call"));
    }

    #[test]
    fn return_with_call_is_fine() {
        // call F; end; label F; return
        assert!(verify_source("TFLFT TTT TFFFT TLT").is_empty());
    }

    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein("FLF", "FLF"), 0);
        assert_eq!(levenshtein("FLF", "FL"), 1);
        assert_eq!(levenshtein("", "LLL"), 3);
    }
}
