use crate::types::{CanonBook, Testament};

/// The 66 books in Protestant canonical order.
pub const CANONICAL_ORDER: [&str; 66] = [
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

/// Order index assigned to books missing from the canonical table; sorts them last.
pub const UNKNOWN_BOOK_ORDER: u32 = CANONICAL_ORDER.len() as u32 + 1;

/// 1-based canonical position of a book, if it is one of the 66.
#[must_use]
pub fn canonical_order(name: &str) -> Option<u32> {
    CANONICAL_ORDER
        .iter()
        .position(|b| *b == name)
        .map(|idx| idx as u32 + 1)
}

#[must_use]
pub fn canon_book(name: &str) -> CanonBook {
    let order = canonical_order(name).unwrap_or(UNKNOWN_BOOK_ORDER);
    CanonBook {
        name: name.to_string(),
        canonical_order: order,
        testament: Testament::from_order(order),
    }
}
