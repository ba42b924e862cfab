//! Single-depth menu bar where at most one menu is open

use crate::domain::Rect;
use crate::render::canvas::{Canvas, text_width};

use super::button::{BUTTON_HEIGHT, Button};
use super::registry::UiContext;

/// z-index of hidden menu entries, below anything hittable
pub const HIDDEN_Z: i32 = -1;
/// z-index of the menu bar and open entries
pub const MENU_Z: i32 = 9999;
/// Width of a drop-down entry
pub const CHILD_WIDTH: i32 = 200;

#[derive(Debug)]
struct MenuNode<A> {
    button: Button<usize>,
    children: Vec<Button<A>>,
    open: bool,
}

#[derive(Debug)]
pub struct MenuTree<A> {
    nodes: Vec<MenuNode<A>>,
    next_x: i32,
}

impl<A> Default for MenuTree<A> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            next_x: 10,
        }
    }
}

impl<A: Clone> MenuTree<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level menu to the bar; returns its index
    pub fn add_parent(&mut self, ui: &mut UiContext, name: &str) -> usize {
        let index = self.nodes.len();
        let width = text_width(name) + 16;
        let rect = Rect::from_origin(self.next_x, 0, width, BUTTON_HEIGHT);
        self.next_x += width;
        self.nodes.push(MenuNode {
            button: Button::new(ui, name, rect, MENU_Z, index),
            children: Vec::new(),
            open: false,
        });
        index
    }

    /// Append an entry under a top-level menu
    pub fn add_child(&mut self, ui: &mut UiContext, parent: usize, label: &str, action: A) {
        let Some(node) = self.nodes.get_mut(parent) else {
            return;
        };
        let origin = node.button.rect().normalized();
        let y = origin.y2 + node.children.len() as i32 * BUTTON_HEIGHT;
        let rect = Rect::from_origin(origin.x1, y, CHILD_WIDTH, BUTTON_HEIGHT);
        let z = if node.open { MENU_Z } else { HIDDEN_Z };
        node.children.push(Button::new(ui, label, rect, z, action));
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.button.label() == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn open_menu(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.open)
    }

    pub fn children(&self, parent: usize) -> impl Iterator<Item = &Button<A>> {
        self.nodes.get(parent).into_iter().flat_map(|n| n.children.iter())
    }

    /// Flip one menu and hide all others
    pub fn toggle(&mut self, ui: &mut UiContext, index: usize) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let open = i == index && !node.open;
            set_open(node, ui, open);
        }
    }

    pub fn close_all(&mut self, ui: &mut UiContext) {
        for node in self.nodes.iter_mut() {
            set_open(node, ui, false);
        }
    }

    /// Route this frame's pointer through the menus
    ///
    /// A top-level click toggles its menu. An entry click returns its action
    /// and closes the menu. A press anywhere else closes whatever is open.
    pub fn update(&mut self, ui: &mut UiContext) -> Option<A> {
        let mut toggled = None;
        let mut fired = None;
        let mut over_menu = false;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            over_menu |= ui.is_hovered(node.button.id());
            if let Some(index) = node.button.update(ui) {
                toggled = Some(index);
            }
            for child in node.children.iter_mut() {
                over_menu |= ui.is_hovered(child.id());
                if let Some(action) = child.update(ui) {
                    fired = Some((i, action));
                }
            }
        }

        if let Some(index) = toggled {
            self.toggle(ui, index);
            return None;
        }
        if let Some((parent, action)) = fired {
            if let Some(node) = self.nodes.get_mut(parent) {
                set_open(node, ui, false);
            }
            return Some(action);
        }
        if ui.pointer().pressed && !over_menu && self.open_menu().is_some() {
            self.close_all(ui);
        }
        None
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if let Some(last) = self.nodes.last() {
            let bar = Rect::new(0, 0, last.button.rect().x2 + 10, BUTTON_HEIGHT);
            canvas.fill_rect(bar, [125, 125, 125]);
        }
        for node in &self.nodes {
            node.button.draw(canvas);
            if node.open {
                for child in &node.children {
                    child.draw(canvas);
                }
            }
        }
    }
}

fn set_open<A: Clone>(node: &mut MenuNode<A>, ui: &mut UiContext, open: bool) {
    node.open = open;
    let z = if open { MENU_Z } else { HIDDEN_Z };
    for child in node.children.iter_mut() {
        child.set_z_index(ui, z);
    }
}
