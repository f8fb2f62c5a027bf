use super::*;

impl CanvasController {
    /// Zooms one step around the pointer.
    pub(super) fn wheel(&mut self, graph: &mut Graph, ev: &PointerEvent) {
        if self.input_locked || !self.config.allow_dragcanvas {
            return;
        }
        if !self.transform.is_inside(ev.pos) {
            return;
        }
        let factor = if ev.wheel_delta > 0.0 {
            self.config.zoom_step
        } else if ev.wheel_delta < 0.0 {
            1.0 / self.config.zoom_step
        } else {
            return;
        };
        self.transform.change_delta_scale(factor, ev.pos);
        self.pointer.graph_pos = self.transform.to_graph(ev.pos);
        self.set_dirty(true, true);
        graph.change();
    }
}
