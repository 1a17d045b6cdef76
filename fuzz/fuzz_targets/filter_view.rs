#![no_main]

use errorkube_core::{Action, FilterChange, RawEvent, RecencyWindow, Session, SessionInput};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let Ok(records) = RawEvent::parse_array(text) else {
        return;
    };

    let session = Session::new().apply(Action::Input(SessionInput::SnapshotLoaded(records)));
    let total = session.events().len();

    let window = RecencyWindow::ALL[usize::from(selector) % RecencyWindow::ALL.len()];
    let namespace = session.namespaces().first().cloned();
    let session = session
        .apply(Action::Filter(FilterChange::Window(window)))
        .apply(Action::Filter(FilterChange::Namespace(namespace)))
        .apply(Action::Filter(FilterChange::Search(text.chars().take(3).collect())));

    let now = chrono::Utc::now();
    let visible = session.visible(now);
    assert!(visible.len() <= total);
    assert_eq!(session.events().len(), total);
    for pair in session.events().windows(2) {
        if let (Some(a), Some(b)) = (pair[0].created_at(), pair[1].created_at()) {
            assert!(a >= b);
        }
    }
});
