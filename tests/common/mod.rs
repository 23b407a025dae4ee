// Not every test binary uses every helper.
#![allow(dead_code)]

use pipecheck::pipeline::MemoryResources;
use pipecheck::sample;
use pipecheck::TestSession;

/// Canonical form of the sample serializer, so round trips compare equal.
pub const PERSON_DM: &str = "entity Person {\n    prop name;\n}\n";

pub const EMPLOYEE_DM: &str = "entity Employee extends Person {\n    prop company;\n}\n";

/// One warning coded INVALID_TYPE_NAME plus one uncoded info.
pub const INVALID_TYPENAME_DM: &str = "entity person {\n}\n";

pub const DUPLICATE_DM: &str =
    "entity Person {\n    prop name;\n}\n\nentity Person {\n    prop age;\n}\n";

pub fn session_with(files: &[(&str, &str)]) -> TestSession {
    let mut resources = MemoryResources::new();
    for (uri, text) in files {
        resources.insert(*uri, *text);
    }
    TestSession::new(sample::pipeline(resources))
}
