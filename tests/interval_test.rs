mod common;
use basic::mach::Halt;
use common::*;

// A zero-tick interval is due at every statement boundary, which makes
// the firing points deterministic: the handler runs before the next
// statement, and the re-entrancy guard holds it off until RETURN.

#[test]
fn test_interval_fires_between_statements() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL 0 GOSUB 100");
    bed.enter("20 INTERVAL ON");
    bed.enter("30 D=1");
    bed.enter("40 PRINT C;D");
    bed.enter("50 END");
    bed.enter("100 C=C+1");
    bed.enter("110 C=C+1");
    bed.enter("120 INTERVAL STOP");
    bed.enter("130 RETURN");
    assert_eq!(bed.run(), Halt::Ended);
    // The handler ran once, to completion, before line 30; its own
    // statement boundaries did not re-trigger it.
    assert_eq!(bed.output(), "21 \n");
}

#[test]
fn test_interval_off_disables() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL 0 GOSUB 100");
    bed.enter("20 PRINT C");
    bed.enter("30 END");
    bed.enter("100 C=C+1");
    bed.enter("110 RETURN");
    // Armed but never enabled: the handler must not run.
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "0 \n");
}

#[test]
fn test_interval_restores_data_cursor_on_return() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 7");
    bed.enter("20 ON INTERVAL 0 GOSUB 100");
    bed.enter("30 INTERVAL ON");
    bed.enter("40 B=1");
    bed.enter("50 READ X");
    bed.enter("60 PRINT X;Z");
    bed.enter("70 END");
    bed.enter("100 READ Z");
    bed.enter("110 INTERVAL OFF");
    bed.enter("120 RETURN");
    assert_eq!(bed.run(), Halt::Ended);
    // The handler consumed the item, but RETURN put the cursor back,
    // so the main program reads the same 7.
    assert_eq!(bed.output(), "77 \n");
}

#[test]
fn test_interval_handler_return_resumes_exactly() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL 0 GOSUB 100");
    bed.enter("20 INTERVAL ON");
    bed.enter(r#"30 PRINT "a";:PRINT "b""#);
    bed.enter("40 END");
    bed.enter(r#"100 PRINT "i";"#);
    bed.enter("110 INTERVAL STOP");
    bed.enter("120 RETURN");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "iab \n");
}

#[test]
fn test_interval_equals_and_paren_forms() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL = 0 GOSUB 100");
    bed.enter("20 ON INTERVAL(0) GOSUB 100");
    bed.enter("30 PRINT 1");
    bed.enter("40 END");
    bed.enter("100 RETURN");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "1 \n");
}

#[test]
fn test_interval_undefined_handler_line() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL 0 GOSUB 900");
    bed.enter("20 INTERVAL ON");
    bed.enter("30 A=1");
    assert_eq!(
        error_text(bed.run()),
        "Runtime error in 30: Undefined line number"
    );
}

#[test]
fn test_interval_stop_disarms() {
    let mut bed = Bed::new();
    bed.enter("10 ON INTERVAL 0 GOSUB 100");
    bed.enter("20 INTERVAL STOP");
    bed.enter("30 INTERVAL ON");
    bed.enter("40 PRINT C");
    bed.enter("50 END");
    bed.enter("100 C=C+1");
    bed.enter("110 RETURN");
    // STOP disarms; a later INTERVAL ON alone does not re-arm.
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "0 \n");
}

#[test]
fn test_unsupported_on_event() {
    let mut bed = Bed::new();
    bed.enter("10 ON KEY GOSUB 100");
    assert_eq!(
        error_text(bed.run()),
        "Runtime error in 10: Unsupported ON event"
    );
}
