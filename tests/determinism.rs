mod common;

use badge_printer::Participant;

use common::{digest, renderer};

#[test]
fn same_row_same_pixels() {
    let p = Participant::new("Alex", "Volunteer", "M");
    let first = renderer();
    let second = renderer();

    let a = digest(&first.render(&p));
    assert_eq!(a, digest(&first.render(&p)));
    assert_eq!(a, digest(&second.render(&p)), "fresh renderer drew a different label");
}

#[test]
fn rows_do_not_leak_into_each_other() {
    let r = renderer();
    let alex = Participant::new("Alex", "Volunteer", "M");
    let before = digest(&r.render(&alex));
    let _ = r.render(&Participant::new("Maximilian Oberhauser", "Organizer", "XXL"));
    assert_eq!(before, digest(&r.render(&alex)));
}

#[test]
fn different_rows_differ() {
    let r = renderer();
    let a = digest(&r.render(&Participant::new("Alex", "Volunteer", "M")));
    let b = digest(&r.render(&Participant::new("Alex", "Volunteer", "L")));
    assert_ne!(a, b);
}
