use stencil::Model;

#[derive(Model)]
struct Person {
    #[stencil(rename = "Name", hidden)]
    name: String,
}

fn main() {}
