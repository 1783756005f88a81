crate::reexport!(strict);
crate::reexport!(tolerant);
crate::reexport!(outcome);
crate::reexport!(cache);
crate::reexport!(engine);
