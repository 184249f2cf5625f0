//! Native functions made available to JIT-compiled code.
//!
//! A program reaches these through an `extern` declaration, e.g.
//! `extern putchard(c);`.

use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct RuntimeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub ptr: *const u8,
}

pub fn functions() -> [RuntimeFunction; 9] {
    [
        RuntimeFunction::new("putchard", 1, putchard as *const u8),
        RuntimeFunction::new("printd", 1, printd as *const u8),
        RuntimeFunction::new("sin", 1, sin as *const u8),
        RuntimeFunction::new("cos", 1, cos as *const u8),
        RuntimeFunction::new("sqrt", 1, sqrt as *const u8),
        RuntimeFunction::new("exp", 1, exp as *const u8),
        RuntimeFunction::new("log", 1, log as *const u8),
        RuntimeFunction::new("fabs", 1, fabs as *const u8),
        RuntimeFunction::new("pow", 2, pow as *const u8),
    ]
}

pub fn lookup(name: &str) -> Option<RuntimeFunction> {
    functions().into_iter().find(|function| function.name == name)
}

impl RuntimeFunction {
    fn new(name: &'static str, arity: usize, ptr: *const u8) -> Self {
        Self { name, arity, ptr }
    }
}

/// Print the character with code point `x`.
extern "C" fn putchard(x: f64) -> f64 {
    let ch = char::from_u32(x as u32).unwrap_or(char::REPLACEMENT_CHARACTER);

    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{ch}");
    let _ = stdout.flush();

    0.0
}

extern "C" fn printd(x: f64) -> f64 {
    println!("{x}");
    0.0
}

extern "C" fn sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn cos(x: f64) -> f64 {
    x.cos()
}

extern "C" fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

extern "C" fn exp(x: f64) -> f64 {
    x.exp()
}

extern "C" fn log(x: f64) -> f64 {
    x.ln()
}

extern "C" fn fabs(x: f64) -> f64 {
    x.abs()
}

extern "C" fn pow(x: f64, y: f64) -> f64 {
    x.powf(y)
}
