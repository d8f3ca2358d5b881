#![no_main]

use cordyceps_tbtree::model::CursorEquivalenceInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    cordyceps_tbtree::model::run_cursor_equivalence(input.values, input.ops);
});
