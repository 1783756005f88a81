crate::reexport!(diagnostic);
crate::reexport!(lint);
crate::reexport!(rules);
crate::reexport!(pipeline);
