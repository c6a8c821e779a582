use super::FieldDescriptor;
use std::fmt;

/// Everything the mapper knows about one document type.
///
/// Rust has no struct inheritance, so an ancestor is a struct embedded in
/// the derived one; its descriptor is lifted onto the derived type and hung
/// off `superclass`.
pub struct ClassDescriptor<E> {
    name: String,
    collection: Option<String>,
    constructor: Option<fn() -> E>,
    fields: Vec<FieldDescriptor<E>>,
    superclass: Option<Box<ClassDescriptor<E>>>,
}

impl<E: 'static> ClassDescriptor<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            constructor: None,
            fields: Vec::new(),
            superclass: None,
        }
    }

    /// Explicit collection name, replacing the pluralized type name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn constructor(mut self, constructor: fn() -> E) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn field(mut self, field: FieldDescriptor<E>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn extends(mut self, superclass: ClassDescriptor<E>) -> Self {
        self.superclass = Some(Box::new(superclass));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection_override(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn zero_arg_constructor(&self) -> Option<fn() -> E> {
        self.constructor
    }

    pub fn fields(&self) -> &[FieldDescriptor<E>] {
        &self.fields
    }

    pub fn superclass(&self) -> Option<&ClassDescriptor<E>> {
        self.superclass.as_deref()
    }

    /// This type followed by each ancestor, most derived first.
    pub fn ancestry(&self) -> Ancestry<'_, E> {
        Ancestry { next: Some(self) }
    }

    /// Moves this descriptor onto `D`, which embeds an `E`.
    ///
    /// The ancestor's own constructor is dropped: only the most derived
    /// type is ever constructed.
    pub fn lift<D: 'static>(
        self,
        project: fn(&D) -> &E,
        project_mut: fn(&mut D) -> &mut E,
    ) -> ClassDescriptor<D> {
        ClassDescriptor {
            name: self.name,
            collection: self.collection,
            constructor: None,
            fields: self
                .fields
                .into_iter()
                .map(|field| field.lift(project, project_mut))
                .collect(),
            superclass: self
                .superclass
                .map(|superclass| Box::new(superclass.lift(project, project_mut))),
        }
    }
}

impl<E> fmt::Debug for ClassDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("has_constructor", &self.constructor.is_some())
            .field("fields", &self.fields)
            .field("superclass", &self.superclass)
            .finish()
    }
}

pub struct Ancestry<'a, E> {
    next: Option<&'a ClassDescriptor<E>>,
}

impl<'a, E> Iterator for Ancestry<'a, E> {
    type Item = &'a ClassDescriptor<E>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass.as_deref();
        Some(current)
    }
}

/// Types that can describe themselves to the mapper.
///
/// Usually implemented with `#[derive(Document)]`.
pub trait Document: Sized + 'static {
    fn descriptor() -> ClassDescriptor<Self>;
}
