//! Plugin context and manager for [`DrawingSurface`](super::DrawingSurface).
//!
//! A plugin receives the context built so far and returns it, usually with
//! one more capability bundle attached. Bundles are stored by type, so a
//! later plugin can look up what an earlier one contributed.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// What plugins know about the surface they are attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    /// Whether the surface owns a canvas
    pub ready: bool,
}

struct Extension {
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// Typed extension map shared by the plugins of one surface
pub struct PluginContext {
    surface: SurfaceInfo,
    extensions: HashMap<TypeId, Extension>,
    order: Vec<TypeId>,
}

impl PluginContext {
    pub fn new(surface: SurfaceInfo) -> Self {
        Self {
            surface,
            extensions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The owning surface
    pub fn surface(&self) -> SurfaceInfo {
        self.surface
    }

    /// Attach a capability bundle and hand the context back
    pub fn provide<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Attach a capability bundle, returning the one it replaces
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        let id = TypeId::of::<T>();
        let previous = self.extensions.insert(
            id,
            Extension {
                name: type_name::<T>(),
                value: Box::new(value),
            },
        );
        match previous {
            Some(ext) => ext.value.downcast::<T>().ok().map(|b| *b),
            None => {
                self.order.push(id);
                None
            }
        }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|ext| ext.value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|ext| ext.value.downcast_mut::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Type names of the attached bundles, in the order they were first attached
    pub fn names(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|id| self.extensions.get(id).map(|ext| ext.name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("surface", &self.surface)
            .field("extensions", &self.names())
            .finish()
    }
}

/// Extends a surface's context at construction time.
///
/// Implemented for any `Fn(PluginContext) -> PluginContext`.
pub trait Plugin {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn apply(&self, context: PluginContext) -> PluginContext;
}

impl<F> Plugin for F
where
    F: Fn(PluginContext) -> PluginContext,
{
    fn apply(&self, context: PluginContext) -> PluginContext {
        self(context)
    }
}

/// Owns the plugin context of one surface
#[derive(Debug)]
pub struct PluginManager {
    context: PluginContext,
}

impl PluginManager {
    /// Manager with an empty context bound to `surface`
    pub fn new(surface: SurfaceInfo) -> Self {
        Self {
            context: PluginContext::new(surface),
        }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PluginContext {
        &mut self.context
    }

    /// Thread the context through `f` by value
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(PluginContext) -> PluginContext,
    {
        let surface = self.context.surface;
        let current = std::mem::replace(&mut self.context, PluginContext::new(surface));
        self.context = f(current);
    }
}
