use super::RawRecord;

/// Built-in catalog served until the first upload
const SAMPLE_CATALOG: [(&str, &str, &str, &str); 20] = [
    ("Wednesday", "English", "TV Show", "245,000,000"),
    ("Stranger Things", "English", "TV Show", "582,100,000"),
    ("The Crown", "English", "TV Show", "107,390,000"),
    ("Bridgerton", "English", "TV Show", "625,490,000"),
    ("Money Heist", "Spanish", "TV Show", "444,000,000"),
    ("Squid Game", "Korean", "TV Show", "1,650,450,000"),
    ("Ozark", "English", "TV Show", "491,070,000"),
    ("The Witcher", "English", "TV Show", "541,020,000"),
    ("Narcos", "Spanish", "TV Show", "113,380,000"),
    ("Dark", "German", "TV Show", "188,170,000"),
    ("Elite", "Spanish", "TV Show", "270,000,000"),
    ("Casa de Papel", "Spanish", "TV Show", "444,000,000"),
    ("You", "English", "TV Show", "540,730,000"),
    ("Lucifer", "English", "TV Show", "569,500,000"),
    ("The Umbrella Academy", "English", "TV Show", "394,020,000"),
    ("Orange Is the New Black", "English", "TV Show", "105,980,000"),
    ("House of Cards", "English", "TV Show", "364,020,000"),
    ("Black Mirror", "English", "TV Show", "103,440,000"),
    ("Mindhunter", "English", "TV Show", "97,980,000"),
    ("The Queen's Gambit", "English", "TV Show", "625,490,000"),
];

pub fn sample_records() -> Vec<RawRecord> {
    SAMPLE_CATALOG
        .iter()
        .map(|(title, language, content_type, hours)| {
            RawRecord::new(title, language, content_type, hours)
        })
        .collect()
}
