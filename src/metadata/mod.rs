crate::reexport!(column);
crate::reexport!(table);
crate::reexport!(schema);
crate::reexport!(routine);
crate::reexport!(snapshot);
crate::reexport!(source);
crate::reexport!(cache);

use std::collections::HashMap;
use tokio::sync::RwLock;

pub type Data<T> = RwLock<HashMap<String, T>>;
