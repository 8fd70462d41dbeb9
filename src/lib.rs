//! # retrobasic
//!
//! An interactive, line-numbered BASIC in the GW-BASIC tradition.
//!
//! Programs are stored as numbered lines of text. Statements are tokenized,
//! parsed, and executed on demand, with classic control flow (GOTO, GOSUB,
//! FOR/NEXT, IF/THEN, DATA/READ, a timer-driven interrupt), 16-bit integer
//! and double numerics, and a CONT command that resumes a stopped program
//! from the exact line and offset where it was interrupted.
//!
//! The `mach::Runtime` owns all program state and exposes the operations a
//! shell needs: store and delete lines, run, continue, list, clear, and
//! immediate-mode execution. Output goes through a `mach::Screen` and INPUT
//! blocks on a `mach::LineInput`, both supplied by the host.

pub mod lang;
pub mod mach;
pub mod term;
