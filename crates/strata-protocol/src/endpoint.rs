/// REST endpoint paths for the object store.
pub mod endpoints {
    /// Batch endpoint; used for every multi-object call, saves and deletes alike.
    pub const BATCH: &str = "/1/batch";

    /// Collection path for a class: create (POST).
    pub fn class(class_name: &str) -> String {
        format!("/1/classes/{class_name}")
    }

    /// Single-object path: fetch (GET), update (PUT), delete (DELETE).
    pub fn object(class_name: &str, object_id: &str) -> String {
        format!("/1/classes/{class_name}/{object_id}")
    }
}
