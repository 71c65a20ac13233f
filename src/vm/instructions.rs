use crate::ast::*;

use super::{ErrorKind, Flow, Machine, RuntimeError};

type VmResult<T> = Result<T, RuntimeError>;

fn fail<T>(kind: ErrorKind, pos: &Position) -> VmResult<T> {
    Err(RuntimeError::new(kind, Some(pos)))
}

/// Index of the first instruction after the mark for `label`.
fn resolve(program: &Program, label: &Label, pos: &Position) -> VmResult<usize> {
    match program.label(label) {
        Some(index) => Ok(index + 1),
        None => fail(ErrorKind::UnresolvedLabel(label.clone()), pos),
    }
}

/// Checks an operand of `copy`/`slide` against the current stack depth.
fn depth_operand(op: &str, n: i64, depth: usize, pos: &Position) -> VmResult<usize> {
    if n < 0 {
        return fail(
            ErrorKind::InvalidOperand(format!("{op} parameter must be a positive number")),
            pos,
        );
    }
    match usize::try_from(n) {
        Ok(n) if n < depth => Ok(n),
        _ => fail(
            ErrorKind::InvalidOperand(format!(
                "{op} index {n} is out of range for stack length {depth}"
            )),
            pos,
        ),
    }
}

impl Instruction {
    /// Apply this instruction to `machine`. Only machine state is touched; the returned
    /// [`Flow`] tells the executor where to continue.
    pub fn execute(&self, machine: &mut Machine, program: &Program) -> VmResult<Flow> {
        match self {
            Instruction::Push { value } => machine.push(*value),
            Instruction::Duplicate { pos } => {
                let v = machine.pop(pos)?;
                machine.push(v);
                machine.push(v);
            }
            Instruction::Copy { n, pos } => {
                let depth = machine.stack.len();
                let n = depth_operand("copy", *n, depth, pos)?;
                let v = machine.stack[depth - 1 - n];
                machine.push(v);
            }
            Instruction::Swap { pos } => {
                let a = machine.pop(pos)?;
                let b = machine.pop(pos)?;
                machine.push(a);
                machine.push(b);
            }
            Instruction::Discard { pos } => {
                machine.pop(pos)?;
            }
            Instruction::Slide { n, pos } => {
                let depth = machine.stack.len();
                let n = depth_operand("slide", *n, depth, pos)?;
                let top = machine.pop(pos)?;
                machine.stack.truncate(depth - 1 - n);
                machine.push(top);
            }

            Instruction::Addition { pos } => binary(machine, pos, i64::wrapping_add)?,
            Instruction::Subtraction { pos } => binary(machine, pos, i64::wrapping_sub)?,
            Instruction::Multiplication { pos } => binary(machine, pos, i64::wrapping_mul)?,
            Instruction::Division { pos } => divide(machine, pos, i64::wrapping_div)?,
            Instruction::Modulo { pos } => divide(machine, pos, i64::wrapping_rem)?,

            Instruction::Store { pos } => {
                let value = machine.pop(pos)?;
                let address = machine.pop(pos)?;
                machine.heap.insert(address, value);
            }
            Instruction::Retrieve { pos } => {
                let address = machine.pop(pos)?;
                match machine.heap.get(&address) {
                    Some(&value) => machine.push(value),
                    None => return fail(ErrorKind::InvalidHeapAccess(address), pos),
                }
            }

            Instruction::OutputChar { pos } => {
                let n = machine.pop(pos)?;
                let c = u32::try_from(n)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                machine.emit(c.encode_utf8(&mut [0; 4]), pos)?;
            }
            Instruction::OutputNum { pos } => {
                let n = machine.pop(pos)?;
                machine.emit(&n.to_string(), pos)?;
            }
            Instruction::InputChar { pos } => {
                let line = machine.read_line().unwrap_or_default();
                let Some(c) = line.chars().next() else {
                    return fail(ErrorKind::MalformedInput("input is empty".into()), pos);
                };
                let address = machine.pop(pos)?;
                machine.heap.insert(address, i64::from(u32::from(c)));
            }
            Instruction::InputNum { pos } => {
                let Some(line) = machine.read_line() else {
                    return fail(ErrorKind::MalformedInput("input is empty".into()), pos);
                };
                let Ok(n) = line.parse::<i64>() else {
                    return fail(
                        ErrorKind::MalformedInput(format!("input \"{line}\" is not numeric")),
                        pos,
                    );
                };
                let address = machine.pop(pos)?;
                machine.heap.insert(address, n);
            }

            Instruction::MarkLabel { .. } => {}
            Instruction::Call { label, pos } => {
                let target = resolve(program, label, pos)?;
                machine.call_stack.push(machine.pc);
                return Ok(Flow::Jump(target));
            }
            Instruction::Jump { label, pos } => return Ok(Flow::Jump(resolve(program, label, pos)?)),
            Instruction::JumpIfZero { label, pos } => {
                if machine.pop(pos)? == 0 {
                    return Ok(Flow::Jump(resolve(program, label, pos)?));
                }
            }
            Instruction::JumpIfNegative { label, pos } => {
                if machine.pop(pos)? < 0 {
                    return Ok(Flow::Jump(resolve(program, label, pos)?));
                }
            }
            Instruction::Return { pos } => {
                let call_site = machine.pop_call(pos)?;
                return Ok(Flow::Jump(call_site + 1));
            }
            Instruction::EndProgram => return Ok(Flow::Halt),
        }
        Ok(Flow::Next)
    }
}

/// Pops rhs then lhs and pushes `op(lhs, rhs)`.
fn binary(machine: &mut Machine, pos: &Position, op: fn(i64, i64) -> i64) -> VmResult<()> {
    let rhs = machine.pop(pos)?;
    let lhs = machine.pop(pos)?;
    machine.push(op(lhs, rhs));
    Ok(())
}

/// Like [`binary`], but a zero divisor fails after both operands are consumed.
fn divide(machine: &mut Machine, pos: &Position, op: fn(i64, i64) -> i64) -> VmResult<()> {
    let rhs = machine.pop(pos)?;
    let lhs = machine.pop(pos);
    if rhs == 0 {
        return fail(ErrorKind::DivideByZero, pos);
    }
    machine.push(op(lhs?, rhs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use super::*;
    use crate::vm::{BufferSink, ScriptedInput};

    fn pos() -> Position {
        Position::new("t.fflt", 1, 1)
    }

    fn machine_with(stack: &[i64], input: &[&str]) -> (Machine, BufferSink) {
        let out = BufferSink::new();
        let mut m = Machine::new(
            Box::new(ScriptedInput::new(input.iter().copied())),
            Box::new(out.clone()),
        );
        m.stack.extend_from_slice(stack);
        (m, out)
    }

    fn empty_program() -> Program {
        Program::new(vec![], BTreeMap::new())
    }

    fn exec(ins: Instruction, m: &mut Machine) -> VmResult<Flow> {
        ins.execute(m, &empty_program())
    }

    #[test]
    fn arithmetic_is_lhs_op_rhs() {
        let cases = [
            (Instruction::Addition { pos: pos() }, 10),
            (Instruction::Subtraction { pos: pos() }, 4),
            (Instruction::Multiplication { pos: pos() }, 21),
            (Instruction::Division { pos: pos() }, 2),
            (Instruction::Modulo { pos: pos() }, 1),
        ];
        for (ins, expected) in cases {
            let (mut m, _) = machine_with(&[7, 3], &[]);
            assert_eq!(exec(ins, &mut m), Ok(Flow::Next));
            assert_eq!(m.stack, vec![expected]);
        }
    }

    #[test]
    fn division_truncates_toward_zero() {
        let (mut m, _) = machine_with(&[-7, 2], &[]);
        exec(Instruction::Division { pos: pos() }, &mut m).unwrap();
        exec(Instruction::Push { value: -7 }, &mut m).unwrap();
        exec(Instruction::Push { value: 2 }, &mut m).unwrap();
        exec(Instruction::Modulo { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![-3, -1]);
    }

    #[test]
    fn divide_by_zero_pops_both_and_pushes_nothing() {
        for ins in [Instruction::Division { pos: pos() }, Instruction::Modulo { pos: pos() }] {
            let (mut m, _) = machine_with(&[1, 5, 0], &[]);
            let err = exec(ins, &mut m).unwrap_err();
            assert_eq!(err.kind, ErrorKind::DivideByZero);
            assert_eq!(err.position, Some(pos()));
            assert_eq!(m.stack, vec![1]);
        }
    }

    #[test]
    fn divide_by_zero_reported_even_without_lhs() {
        let (mut m, _) = machine_with(&[0], &[]);
        let err = exec(Instruction::Division { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivideByZero);
    }

    #[test]
    fn arithmetic_underflow_keeps_partial_pops() {
        let (mut m, _) = machine_with(&[4], &[]);
        let err = exec(Instruction::Addition { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackUnderflow);
        assert!(m.stack.is_empty());
    }

    #[test]
    fn duplicate_swap_discard() {
        let (mut m, _) = machine_with(&[1, 2], &[]);
        exec(Instruction::Swap { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![2, 1]);
        exec(Instruction::Duplicate { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![2, 1, 1]);
        exec(Instruction::Discard { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![2, 1]);

        let (mut m, _) = machine_with(&[], &[]);
        let err = exec(Instruction::Discard { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackUnderflow);
    }

    #[test]
    fn copy_reads_from_top() {
        let (mut m, _) = machine_with(&[10, 20, 30], &[]);
        exec(Instruction::Copy { n: 0, pos: pos() }, &mut m).unwrap();
        exec(Instruction::Copy { n: 3, pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![10, 20, 30, 30, 10]);
    }

    #[test]
    fn copy_rejects_bad_operands() {
        for n in [-1, 3, i64::MAX] {
            let (mut m, _) = machine_with(&[10, 20, 30], &[]);
            let err = exec(Instruction::Copy { n, pos: pos() }, &mut m).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::InvalidOperand(_)), "n = {n}");
            assert_eq!(m.stack, vec![10, 20, 30]);
        }
    }

    #[test]
    fn slide_keeps_top() {
        let (mut m, _) = machine_with(&[1, 2, 3, 4, 5], &[]);
        exec(Instruction::Slide { n: 2, pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![1, 2, 5]);
        exec(Instruction::Slide { n: 0, pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![1, 2, 5]);
        exec(Instruction::Slide { n: 2, pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![5]);
    }

    #[test]
    fn slide_rejects_bad_operands() {
        for n in [-2, 2] {
            let (mut m, _) = machine_with(&[1, 2], &[]);
            let err = exec(Instruction::Slide { n, pos: pos() }, &mut m).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::InvalidOperand(_)));
        }
    }

    #[test]
    fn store_then_retrieve() {
        let (mut m, _) = machine_with(&[100, 42], &[]);
        exec(Instruction::Store { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.heap.get(&100), Some(&42));
        m.push(100);
        exec(Instruction::Retrieve { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.stack, vec![42]);
    }

    #[test]
    fn retrieve_unknown_address() {
        let (mut m, _) = machine_with(&[9], &[]);
        let err = exec(Instruction::Retrieve { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHeapAccess(9));
    }

    #[test]
    fn output_instructions_emit_exact_text() {
        let (mut m, out) = machine_with(&[-12, 72, 0x1F600], &[]);
        exec(Instruction::OutputChar { pos: pos() }, &mut m).unwrap();
        exec(Instruction::OutputChar { pos: pos() }, &mut m).unwrap();
        exec(Instruction::OutputNum { pos: pos() }, &mut m).unwrap();
        assert_eq!(out.contents(), "\u{1F600}H-12");
    }

    #[test]
    fn output_char_out_of_range_is_replacement() {
        let (mut m, out) = machine_with(&[-1], &[]);
        exec(Instruction::OutputChar { pos: pos() }, &mut m).unwrap();
        assert_eq!(out.contents(), "\u{FFFD}");
    }

    #[test]
    fn input_char_stores_first_char() {
        let (mut m, _) = machine_with(&[5], &["hello"]);
        exec(Instruction::InputChar { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.heap.get(&5), Some(&('h' as i64)));
    }

    #[test]
    fn input_num_parses_signed_decimal() {
        let (mut m, _) = machine_with(&[1, 2], &["-35", "abc"]);
        exec(Instruction::InputNum { pos: pos() }, &mut m).unwrap();
        assert_eq!(m.heap.get(&2), Some(&-35));
        let err = exec(Instruction::InputNum { pos: pos() }, &mut m).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedInput(_)));
        assert_eq!(m.stack, vec![1]);
    }

    #[test]
    fn input_num_rejects_surrounding_whitespace() {
        let (mut m, _) = machine_with(&[0], &[" 5 "]);
        let err = exec(Instruction::InputNum { pos: pos() }, &mut m).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedInput(_)));
        assert!(m.heap.is_empty());
    }

    #[test]
    fn empty_input_is_malformed() {
        let (mut m, _) = machine_with(&[0, 0], &[""]);
        let err = exec(Instruction::InputChar { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedInput("input is empty".into()));
        let err = exec(Instruction::InputNum { pos: pos() }, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedInput("input is empty".into()));
    }

    #[test]
    fn flow_control_targets() {
        let mut labels = BTreeMap::new();
        labels.insert(Rc::from("F"), 4);
        let program = Program::new(vec![], labels);
        let (mut m, _) = machine_with(&[0, 1, -1], &[]);
        m.pc = 2;
        let lbl: Label = Rc::from("F");

        let neg = Instruction::JumpIfNegative { label: lbl.clone(), pos: pos() };
        assert_eq!(neg.execute(&mut m, &program), Ok(Flow::Jump(5)));
        let zero = Instruction::JumpIfZero { label: lbl.clone(), pos: pos() };
        assert_eq!(zero.execute(&mut m, &program), Ok(Flow::Next));
        assert_eq!(zero.execute(&mut m, &program), Ok(Flow::Jump(5)));

        let call = Instruction::Call { label: lbl.clone(), pos: pos() };
        assert_eq!(call.execute(&mut m, &program), Ok(Flow::Jump(5)));
        assert_eq!(m.call_stack, vec![2]);
        assert_eq!(Instruction::Return { pos: pos() }.execute(&mut m, &program), Ok(Flow::Jump(3)));
        assert_eq!(Instruction::EndProgram.execute(&mut m, &program), Ok(Flow::Halt));
    }

    #[test]
    fn untaken_branch_skips_label_lookup() {
        let (mut m, _) = machine_with(&[7], &[]);
        let ins = Instruction::JumpIfZero { label: Rc::from("NOPE"), pos: pos() };
        assert_eq!(exec(ins, &mut m), Ok(Flow::Next));
    }

    #[test]
    fn failed_call_leaves_call_stack_alone() {
        let (mut m, _) = machine_with(&[], &[]);
        let ins = Instruction::Call { label: Rc::from("NOPE"), pos: pos() };
        let err = exec(ins, &mut m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedLabel(Rc::from("NOPE")));
        assert!(m.call_stack.is_empty());
    }
}
