use edutools::{
    course::{AnswerPlaceholder, TaskFile},
    stepik::parsers::{Segment, parser, set_placeholders_from_tags, strip_tags},
};

fn file_with_placeholders(count: usize) -> TaskFile {
    let mut file = TaskFile::new("hello.py", "");
    file.placeholders = (0..count)
        .map(|_| AnswerPlaceholder::builder().build())
        .collect();
    file
}

#[test]
fn segments_split_tags_from_text() {
    let segments = parser::segments("a<placeholder>b</placeholder>c").expect("parse");
    assert_eq!(segments, vec![
        Segment::Text("a".into()),
        Segment::Open,
        Segment::Text("b".into()),
        Segment::Close,
        Segment::Text("c".into()),
    ]);
}

#[test]
fn lone_angle_brackets_are_text() {
    assert_eq!(strip_tags("if a < b and b > c"), "if a < b and b > c");
    assert_eq!(strip_tags("<placeholder"), "<placeholder");
}

#[test]
fn tags_set_offsets_in_the_stripped_text() {
    let mut file = file_with_placeholders(2);
    let text = "print(\"Hello, world! My name is <placeholder>Liana</placeholder>\")\nx = \
                <placeholder>42</placeholder>";

    set_placeholders_from_tags(&mut file, text).expect("tags for both placeholders");

    assert_eq!(file.placeholders[0].offset, 32);
    assert_eq!(file.placeholders[0].length, 5);
    assert_eq!(file.placeholders[1].offset, 44);
    assert_eq!(file.placeholders[1].length, 2);
    assert_eq!(
        strip_tags(text),
        "print(\"Hello, world! My name is Liana\")\nx = 42"
    );
}

#[test]
fn offsets_count_characters() {
    let mut file = file_with_placeholders(1);
    set_placeholders_from_tags(&mut file, "имя = <placeholder>Лиана</placeholder>").expect("tags");

    assert_eq!(file.placeholders[0].offset, 6);
    assert_eq!(file.placeholders[0].length, 5);
}

#[test]
fn missing_tags_name_the_placeholder() {
    let mut file = file_with_placeholders(2);
    let err = set_placeholders_from_tags(&mut file, "<placeholder>only one</placeholder>")
        .expect_err("second placeholder has no tags");

    assert_eq!(err.file, "hello.py");
    assert_eq!(err.placeholder, 2);
}

#[test]
fn extra_tags_are_ignored() {
    let mut file = file_with_placeholders(1);
    set_placeholders_from_tags(
        &mut file,
        "<placeholder>a</placeholder> <placeholder>b</placeholder>",
    )
    .expect("tags");

    assert_eq!(file.placeholders.len(), 1);
    assert_eq!(file.placeholders[0].offset, 0);
    assert_eq!(file.placeholders[0].length, 1);
}
