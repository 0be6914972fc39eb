//! Element discovery.
//!
//! Replaces the legacy reflective field scan with an explicit walk over what
//! the screen declared at construction time. Discovery order: elements from
//! [`Screen::manual_elements`] first, then every declared single and group
//! member in declaration order, then the return element contributed by the
//! base layer (when it is not the dummy stand-in).

use crate::error::Result;
use crate::screen::core::{Declared, Screen};

/// Run discovery unless it already ran for this screen instance.
pub(crate) fn ensure_registered(screen: &mut dyn Screen) -> Result<()> {
    if screen.state().is_registered() {
        return Ok(());
    }
    register(screen)
}

/// Reset the run-once guard and rebuild the element set, used by the live
/// refresh.
pub(crate) fn reregister(screen: &mut dyn Screen) -> Result<()> {
    screen.state_mut().reset_registration();
    register(screen)
}

fn register(screen: &mut dyn Screen) -> Result<()> {
    let mut elements = screen.manual_elements();

    let state = screen.state_mut();
    for entry in state.declared() {
        match entry {
            Declared::Single(element) => elements.push(element.clone()),
            Declared::Group { members } => elements.extend(members.iter().cloned()),
        }
    }

    let return_element = state.return_element().clone();
    if !return_element.is_dummy() {
        elements.push(return_element);
    }

    state.replace_elements(elements);
    state.mark_registered();
    Ok(())
}
