/*!
## Machine Module

The BASIC machine: values and their coercions, the arithmetic and
relational operations, variable and array memory, the program store with
its DATA cache, the expression evaluator, the statement executor, and
the runtime state machine that drives it all.

*/

mod eval;
mod exec;
mod function;
mod operation;
mod program;
mod runtime;
mod screen;
mod val;
mod var;

pub use exec::Flow;
pub use operation::Operation;
pub use program::Program;
pub use runtime::Cursor;
pub use runtime::Halt;
pub use runtime::Loc;
pub use runtime::Runtime;
pub use screen::LineInput;
pub use screen::NullScreen;
pub use screen::QueueInput;
pub use screen::Screen;
pub use val::Val;
pub use var::Var;
