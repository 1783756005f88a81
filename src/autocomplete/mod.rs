crate::reexport!(context);
crate::reexport!(item);
crate::reexport!(scoring);
