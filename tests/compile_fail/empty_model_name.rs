use stencil::Model;

#[derive(Model)]
#[stencil(name = "")]
struct Person {
    name: String,
}

fn main() {}
