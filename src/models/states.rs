//! US state lookup tables.
//!
//! Codes follow the Census Bureau state FIPS list:
//! https://www.census.gov/library/reference/code-lists/ansi.html

/// (USPS abbreviation, FIPS code, full name)
const STATES: &[(&str, &str, &str)] = &[
    ("AL", "01", "Alabama"),
    ("AK", "02", "Alaska"),
    ("AZ", "04", "Arizona"),
    ("AR", "05", "Arkansas"),
    ("CA", "06", "California"),
    ("CO", "08", "Colorado"),
    ("CT", "09", "Connecticut"),
    ("DE", "10", "Delaware"),
    ("DC", "11", "District of Columbia"),
    ("FL", "12", "Florida"),
    ("GA", "13", "Georgia"),
    ("HI", "15", "Hawaii"),
    ("ID", "16", "Idaho"),
    ("IL", "17", "Illinois"),
    ("IN", "18", "Indiana"),
    ("IA", "19", "Iowa"),
    ("KS", "20", "Kansas"),
    ("KY", "21", "Kentucky"),
    ("LA", "22", "Louisiana"),
    ("ME", "23", "Maine"),
    ("MD", "24", "Maryland"),
    ("MA", "25", "Massachusetts"),
    ("MI", "26", "Michigan"),
    ("MN", "27", "Minnesota"),
    ("MS", "28", "Mississippi"),
    ("MO", "29", "Missouri"),
    ("MT", "30", "Montana"),
    ("NE", "31", "Nebraska"),
    ("NV", "32", "Nevada"),
    ("NH", "33", "New Hampshire"),
    ("NJ", "34", "New Jersey"),
    ("NM", "35", "New Mexico"),
    ("NY", "36", "New York"),
    ("NC", "37", "North Carolina"),
    ("ND", "38", "North Dakota"),
    ("OH", "39", "Ohio"),
    ("OK", "40", "Oklahoma"),
    ("OR", "41", "Oregon"),
    ("PA", "42", "Pennsylvania"),
    ("RI", "44", "Rhode Island"),
    ("SC", "45", "South Carolina"),
    ("SD", "46", "South Dakota"),
    ("TN", "47", "Tennessee"),
    ("TX", "48", "Texas"),
    ("UT", "49", "Utah"),
    ("VT", "50", "Vermont"),
    ("VA", "51", "Virginia"),
    ("WA", "53", "Washington"),
    ("WV", "54", "West Virginia"),
    ("WI", "55", "Wisconsin"),
    ("WY", "56", "Wyoming"),
    ("AS", "60", "American Samoa"),
    ("GU", "66", "Guam"),
    ("MP", "69", "Commonwealth of the Northern Mariana Islands"),
    ("PR", "72", "Puerto Rico"),
    ("VI", "78", "United States Virgin Islands"),
];

/// Full state name for a USPS abbreviation ("NC" -> "North Carolina").
/// Matching ignores case and surrounding whitespace.
pub fn state_from_abbrev(abbrev: &str) -> Option<&'static str> {
    let abbrev = abbrev.trim();
    STATES
        .iter()
        .find(|(a, _, _)| a.eq_ignore_ascii_case(abbrev))
        .map(|(_, _, name)| *name)
}

/// Full state name for a FIPS code. Accepts "6" as well as "06".
pub fn state_from_fips(code: &str) -> Option<&'static str> {
    let code = code.trim();
    let padded;
    let code = if code.len() == 1 {
        padded = format!("0{}", code);
        padded.as_str()
    } else {
        code
    };
    STATES
        .iter()
        .find(|(_, fips, _)| *fips == code)
        .map(|(_, _, name)| *name)
}
