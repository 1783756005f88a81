crate::reexport!(text);
crate::reexport!(statement);
crate::reexport!(registry);
