#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use marketcal::extractor::extract;
use marketcal::normalizer::normalize;
use marketcal::page::HtmlPage;
use marketcal::sources::SourceCatalog;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);
    let url = Url::parse("https://example.com/calendar").unwrap();
    let page = HtmlPage::parse(url, &html);

    // Arbitrary markup must never panic any built-in rule set, and every
    // normalized record must carry the full column list.
    for source in SourceCatalog::builtin().iter() {
        let extraction = extract(&source.rules, &page);
        for record in normalize(&extraction.rows, &source.columns) {
            assert_eq!(record.len(), source.columns.len());
        }
    }
});
