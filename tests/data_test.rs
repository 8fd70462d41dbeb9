mod common;
use basic::mach::Halt;
use common::*;

#[test]
fn test_read_in_program_order() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 1,2,3");
    bed.enter("20 READ X,Y,Z");
    bed.enter("30 PRINT X+Y+Z");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "6 \n");
}

#[test]
fn test_read_past_end() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 1,2,3");
    bed.enter("20 READ X,Y,Z");
    bed.enter("30 READ W");
    assert_eq!(error_text(bed.run()), "Runtime error in 30: Out of data");
}

#[test]
fn test_restore_replays() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 1,2,3");
    bed.enter("20 READ X,Y,Z");
    bed.enter("30 RESTORE");
    bed.enter("40 READ A,B,C");
    bed.enter("50 PRINT A;B;C");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "123 \n");
}

#[test]
fn test_restore_to_line() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 1");
    bed.enter("20 DATA 2");
    bed.enter("30 DATA 3");
    bed.enter("40 RESTORE 15");
    bed.enter("50 READ A");
    bed.enter("60 PRINT A");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "2 \n");
}

#[test]
fn test_data_collected_from_whole_program() {
    // DATA after the READ still counts; order is program order.
    let mut bed = Bed::new();
    bed.enter("10 READ A$,B$");
    bed.enter("20 PRINT A$;B$");
    bed.enter("30 END");
    bed.enter(r#"40 DATA first, "second, with comma""#);
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "firstsecond, with comma \n");
}

#[test]
fn test_read_coerces_to_target_type() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 12abc, 12abc");
    bed.enter("20 READ A$,N");
    bed.enter("30 PRINT A$;N");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "12abc12 \n");
}

#[test]
fn test_data_statement_is_not_executed() {
    let mut bed = Bed::new();
    bed.enter("10 DATA ?? not tokens @ all");
    bed.enter("20 PRINT 1");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "1 \n");
}

#[test]
fn test_colon_inside_quoted_data() {
    let mut bed = Bed::new();
    bed.enter(r#"10 DATA "a:b":PRINT 2"#);
    bed.enter("20 READ A$");
    bed.enter("30 PRINT A$");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "2 \na:b \n");
}

#[test]
fn test_edit_invalidates_data_cache() {
    let mut bed = Bed::new();
    bed.enter("10 DATA 1");
    bed.enter("20 READ X");
    bed.enter("30 PRINT X");
    assert_eq!(bed.run(), Halt::Ended);
    bed.enter("10 DATA 9");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "1 \n9 \n");
}

#[test]
fn test_read_into_array() {
    let mut bed = Bed::new();
    bed.enter("10 DIM A(3)");
    bed.enter("20 DATA 5,6");
    bed.enter("30 READ A(1),A(2)");
    bed.enter("40 PRINT A(1)+A(2)");
    assert_eq!(bed.run(), Halt::Ended);
    assert_eq!(bed.output(), "11 \n");
}
