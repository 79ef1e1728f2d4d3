#![no_main]

use libfuzzer_sys::fuzz_target;

use deskadmin::form::FormController;
use deskadmin::model::Record;
use deskadmin::resources::catalog;

fuzz_target!(|data: &[u8]| {
    // Decode an arbitrary backend record and run every resource's rules over
    // it. Validation must only ever report errors, never panic.
    let record: Record = match serde_json::from_slice(data) {
        Ok(r) => r,
        Err(_) => return,
    };

    for spec in catalog() {
        for column in &spec.columns {
            let _ = record.display(column);
        }
        let form = FormController::edit(&spec, record.clone());
        let _ = form.validate();
    }
});
